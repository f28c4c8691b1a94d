// crates/siteboot/src/lib.rs
// ============================================================================
// Module: Siteboot Library
// Description: Configured entry point for the siteboot runtime.
// Purpose: Build a ready-to-use site system from siteboot.toml.
// Dependencies: siteboot-config, siteboot-core, siteboot-store-sqlite
// ============================================================================

//! ## Overview
//! `siteboot` loads configuration, opens the `SQLite` store, selects the event
//! sink and discovers version metadata, returning a [`SqliteSiteSystem`].
//! Nothing is installed or synced until the caller asks for it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bootstrap;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bootstrap::BootstrapError;
pub use bootstrap::SqliteSiteSystem;
pub use bootstrap::build_event_sink;
pub use bootstrap::from_config;
pub use bootstrap::from_config_with_events;
pub use bootstrap::load;
pub use siteboot_config::SitebootConfig;
pub use siteboot_core;
pub use siteboot_store_sqlite::SqliteSiteStore;
