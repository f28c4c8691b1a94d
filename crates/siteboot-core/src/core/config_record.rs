// crates/siteboot-core/src/core/config_record.rs
// ============================================================================
// Module: Siteboot Config Record
// Description: Persistent single-row installation record.
// Purpose: Track the database version stamp and initialized flag.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The config record is created on the first successful sync and updated in
//! place on every later sync. It is the source of truth for "has the system
//! been installed" and for the version comparison behind update checks.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Config Record
// ============================================================================

/// Persistent installation record.
///
/// # Invariants
/// - `id` is zero until the store assigns one on insert.
/// - `updated_at_ms` is unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Row identifier.
    pub id: i64,
    /// Whether installation completed.
    pub is_initialized: bool,
    /// Product version the schema was last synced for.
    pub database_version: String,
    /// Timestamp of the last sync.
    pub updated_at_ms: i64,
    /// Opaque system settings payload.
    pub system_config: String,
}

impl ConfigRecord {
    /// Creates the record written by the first successful sync.
    #[must_use]
    pub fn initial(database_version: impl Into<String>, updated_at_ms: i64) -> Self {
        Self {
            id: 0,
            is_initialized: true,
            database_version: database_version.into(),
            updated_at_ms,
            system_config: String::new(),
        }
    }

    /// Stamps an existing record after a sync, keeping its identity and settings.
    pub fn stamp(&mut self, database_version: impl Into<String>, updated_at_ms: i64) {
        self.database_version = database_version.into();
        self.is_initialized = true;
        self.updated_at_ms = updated_at_ms;
    }
}
