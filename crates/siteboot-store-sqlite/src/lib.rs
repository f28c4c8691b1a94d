// crates/siteboot-store-sqlite/src/lib.rs
// ============================================================================
// Module: Siteboot SQLite Store
// Description: SQLite-backed persistence for the siteboot runtime.
// Purpose: Provide durable schema sync, site and config storage.
// Dependencies: siteboot-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteSiteStore`], a single-connection `SQLite`
//! backend implementing every persistence contract from `siteboot-core`.

pub mod store;

pub use store::SqliteSiteStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
