// crates/siteboot-core/src/interfaces/mod.rs
// ============================================================================
// Module: Siteboot Interfaces
// Description: Backend-agnostic persistence contracts.
// Purpose: Define the storage surfaces consumed by reconciliation, installation
//          and site routing.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The persistence engine is an external collaborator. These traits are the
//! narrow contracts the subsystem relies on; each call is an independent unit
//! of work and no call is wrapped in a cross-call transaction. Failures are
//! returned as [`StoreError`] and propagate unchanged to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::administrator::AdministratorRecord;
use crate::core::config_record::ConfigRecord;
use crate::core::schema::AlterPlan;
use crate::core::schema::TableDescriptor;
use crate::core::site::SiteDescriptor;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Persistence errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// I/O failure.
    #[error("store io error: {0}")]
    Io(String),
    /// Storage engine failure.
    #[error("store error: {0}")]
    Db(String),
    /// Invalid input or stored data.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// Referenced record does not exist.
    #[error("store record not found: {0}")]
    NotFound(String),
    /// Record already exists.
    #[error("store conflict: {0}")]
    Conflict(String),
}

// ============================================================================
// SECTION: Schema Store
// ============================================================================

/// Table existence, creation and alteration.
pub trait SchemaStore {
    /// Returns true when `table_name` exists, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the catalog cannot be queried.
    fn table_exists(&self, table_name: &str) -> Result<bool, StoreError>;

    /// Creates `table` with exactly its declared columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the table cannot be created.
    fn create_table(&self, table: &TableDescriptor) -> Result<(), StoreError>;

    /// Alters an existing table to match `table`, dropping any live column
    /// named in `drop_columns` that the descriptor no longer declares.
    ///
    /// Returns the applied plan; an empty plan means nothing changed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the table cannot be inspected or altered.
    fn alter_table(
        &self,
        table: &TableDescriptor,
        drop_columns: &[&str],
    ) -> Result<AlterPlan, StoreError>;
}

// ============================================================================
// SECTION: Site Store
// ============================================================================

/// Site descriptor access.
pub trait SiteStore {
    /// Returns every site descriptor in store order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when sites cannot be read.
    fn all_sites(&self) -> Result<Vec<SiteDescriptor>, StoreError>;

    /// Returns the distinct content table names referenced by sites.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when sites cannot be read.
    fn all_content_table_names(&self) -> Result<Vec<String>, StoreError>;
}

// ============================================================================
// SECTION: Config Store
// ============================================================================

/// Installation record access.
pub trait ConfigStore {
    /// Returns the config record, if one has been written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be read.
    fn config_record(&self) -> Result<Option<ConfigRecord>, StoreError>;

    /// Inserts the first config record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be written.
    fn insert_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError>;

    /// Updates the existing config record in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be written.
    fn update_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError>;

    /// Returns the persisted database version, empty when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be read.
    fn database_version(&self) -> Result<String, StoreError> {
        Ok(self.config_record()?.map(|record| record.database_version).unwrap_or_default())
    }

    /// Returns true when the persisted record marks installation complete.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be read.
    fn is_initialized(&self) -> Result<bool, StoreError> {
        Ok(self.config_record()?.is_some_and(|record| record.is_initialized))
    }
}

// ============================================================================
// SECTION: Administrator Store
// ============================================================================

/// Administrator account and role membership writes.
pub trait AdministratorStore {
    /// Inserts a new administrator account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the user name is taken, or another
    /// [`StoreError`] when the write fails.
    fn insert_administrator(&self, record: &AdministratorRecord) -> Result<(), StoreError>;

    /// Grants `role_name` to `user_name`; granting an existing membership is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the membership cannot be written.
    fn add_user_to_role(&self, user_name: &str, role_name: &str) -> Result<(), StoreError>;
}

// ============================================================================
// SECTION: Cache Control
// ============================================================================

/// Persistence-side caches.
pub trait CacheControl {
    /// Drops every cached value so the next read goes to storage.
    fn clear_all_caches(&self);
}

// ============================================================================
// SECTION: Persistence
// ============================================================================

/// Full persistence collaborator required by [`crate::SiteSystem`].
pub trait Persistence:
    SchemaStore + SiteStore + ConfigStore + AdministratorStore + CacheControl + Send + Sync
{
}

impl<T> Persistence for T where
    T: SchemaStore + SiteStore + ConfigStore + AdministratorStore + CacheControl + Send + Sync
{
}
