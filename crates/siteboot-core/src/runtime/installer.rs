// crates/siteboot-core/src/runtime/installer.rs
// ============================================================================
// Module: Siteboot Installer
// Description: Install and sync orchestration.
// Purpose: Sequence cache clearing, schema reconciliation, version stamping,
//          administrator bootstrap and registry refresh.
// Dependencies: crate::core, crate::events, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`Installer::sync_database`] runs, in order: clear persistence caches,
//! reconcile system tables, reconcile content tables enumerated from the
//! site table, stamp the config record, then confirm installed state and
//! refresh the site registry. [`Installer::install_database`] additionally
//! creates the bootstrap administrator.
//!
//! Nothing is rolled back: a failure leaves earlier steps applied, and
//! re-running the operation is the expected recovery.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

use crate::core::administrator::AdministratorRecord;
use crate::core::administrator::MAX_USER_NAME_LENGTH;
use crate::core::administrator::PredefinedRole;
use crate::core::catalog::SystemCatalog;
use crate::core::config_record::ConfigRecord;
use crate::core::time::unix_millis;
use crate::core::version::VersionInfo;
use crate::events::SiteEvent;
use crate::events::SiteEventKind;
use crate::events::SiteEventSink;
use crate::interfaces::Persistence;
use crate::interfaces::StoreError;
use crate::runtime::install_state::InstallationState;
use crate::runtime::reconciler::SchemaReconciler;
use crate::runtime::reconciler::TableReport;
use crate::runtime::registry::SiteRegistry;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Installation and sync errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstallError {
    /// Persistence failure; the operation did not complete.
    #[error("install store error: {0}")]
    Store(#[from] StoreError),
    /// Caller input was rejected before any write.
    #[error("install invalid input: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Summary of a completed sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// System table outcomes in catalog order.
    pub system_tables: Vec<TableReport>,
    /// Content table outcomes.
    pub content_tables: Vec<TableReport>,
    /// Version written to the config record.
    pub database_version: String,
    /// Generation of the registry snapshot published after the sync.
    pub snapshot_generation: u64,
}

/// Summary of a completed installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Underlying sync summary.
    pub sync: SyncReport,
    /// Whether a bootstrap administrator was created.
    pub administrator_created: bool,
}

// ============================================================================
// SECTION: Installer
// ============================================================================

/// Borrowed view over the components an install or sync touches.
pub struct Installer<'a, P: Persistence + ?Sized> {
    /// Persistence collaborator.
    persistence: &'a P,
    /// Target schema.
    catalog: &'a SystemCatalog,
    /// Version metadata.
    versions: &'a VersionInfo,
    /// Installed flag.
    state: &'a InstallationState,
    /// Site routing state.
    registry: &'a SiteRegistry,
    /// Event sink.
    events: &'a dyn SiteEventSink,
}

impl<'a, P: Persistence + ?Sized> Installer<'a, P> {
    /// Creates an installer over borrowed components.
    #[must_use]
    pub const fn new(
        persistence: &'a P,
        catalog: &'a SystemCatalog,
        versions: &'a VersionInfo,
        state: &'a InstallationState,
        registry: &'a SiteRegistry,
        events: &'a dyn SiteEventSink,
    ) -> Self {
        Self {
            persistence,
            catalog,
            versions,
            state,
            registry,
            events,
        }
    }

    /// Syncs the database, then creates the bootstrap administrator when both
    /// credentials are non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Invalid`] for an unusable administrator name
    /// and [`InstallError::Store`] for persistence failures. The name is
    /// checked after the sync, so a rejected name leaves the sync applied and
    /// no administrator written.
    pub fn install_database(
        &self,
        admin_name: &str,
        admin_password: &str,
    ) -> Result<InstallReport, InstallError> {
        let create_admin = !admin_name.is_empty() && !admin_password.is_empty();
        let sync = self.sync_database()?;
        if create_admin {
            validate_admin_name(admin_name)?;
            let record = AdministratorRecord::with_password(admin_name, admin_password, unix_millis());
            self.persistence.insert_administrator(&record)?;
            self.persistence
                .add_user_to_role(admin_name, PredefinedRole::ConsoleAdministrator.as_str())?;
            self.events.record(
                &SiteEvent::new(SiteEventKind::AdministratorCreated)
                    .with_detail(PredefinedRole::ConsoleAdministrator.as_str()),
            );
        }
        Ok(InstallReport {
            sync,
            administrator_created: create_admin,
        })
    }

    /// Clears caches, reconciles system then content tables, stamps the
    /// config version, confirms installed state and refreshes the registry.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Store`] for the first persistence failure.
    pub fn sync_database(&self) -> Result<SyncReport, InstallError> {
        self.persistence.clear_all_caches();
        self.events.record(&SiteEvent::new(SiteEventKind::CachesCleared));

        let reconciler = SchemaReconciler::new(self.persistence, self.events);
        let system_tables = reconciler.reconcile_system_tables(self.catalog)?;
        let content_table_names = self.persistence.all_content_table_names()?;
        let content_tables =
            reconciler.reconcile_content_tables(&content_table_names, self.catalog)?;

        let record = self.update_config_version()?;

        if self.state.mark_installed() {
            self.events.record(&SiteEvent::new(SiteEventKind::InstallConfirmed));
        }
        let snapshot = self.registry.refresh(self.persistence, self.events)?;
        Ok(SyncReport {
            system_tables,
            content_tables,
            database_version: record.database_version,
            snapshot_generation: snapshot.generation(),
        })
    }

    /// Inserts the config record on first sync, otherwise updates it in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be read or written.
    pub fn update_config_version(&self) -> Result<ConfigRecord, StoreError> {
        let now = unix_millis();
        let record = match self.persistence.config_record()? {
            None => {
                let record = ConfigRecord::initial(&self.versions.product_version, now);
                self.persistence.insert_config_record(&record)?;
                record
            }
            Some(mut record) => {
                record.stamp(&self.versions.product_version, now);
                self.persistence.update_config_record(&record)?;
                record
            }
        };
        self.events.record(
            &SiteEvent::new(SiteEventKind::ConfigStamped).with_detail(&record.database_version),
        );
        Ok(record)
    }

    /// Returns true when the compiled product version differs, ignoring
    /// ASCII case, from the persisted database version.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the persisted version cannot be read.
    pub fn is_need_update(&self) -> Result<bool, StoreError> {
        let database_version = self.persistence.database_version()?;
        Ok(!self.versions.product_version.eq_ignore_ascii_case(&database_version))
    }
}

/// Rejects administrator names that cannot be stored or displayed safely.
fn validate_admin_name(admin_name: &str) -> Result<(), InstallError> {
    if admin_name.trim() != admin_name {
        return Err(InstallError::Invalid(
            "administrator name must not have surrounding whitespace".to_string(),
        ));
    }
    if admin_name.len() > MAX_USER_NAME_LENGTH {
        return Err(InstallError::Invalid("administrator name exceeds max length".to_string()));
    }
    if admin_name.chars().any(char::is_control) {
        return Err(InstallError::Invalid(
            "administrator name contains control characters".to_string(),
        ));
    }
    Ok(())
}
