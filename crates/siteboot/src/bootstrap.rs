// crates/siteboot/src/bootstrap.rs
// ============================================================================
// Module: Siteboot Bootstrap
// Description: Builds a site system from validated configuration.
// Purpose: Keep backend selection and sink construction out of callers.
// Dependencies: siteboot-config, siteboot-core, siteboot-store-sqlite
// ============================================================================

//! ## Overview
//! Startup order: validate config, build the event sink, discover versions
//! (recording unreadable sources on the sink), then open the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use siteboot_config::EventSinkKind;
use siteboot_config::EventsConfig;
use siteboot_config::SitebootConfig;
use siteboot_core::FileEventSink;
use siteboot_core::NoopEventSink;
use siteboot_core::SiteEventSink;
use siteboot_core::SiteSystem;
use siteboot_core::StderrEventSink;
use siteboot_core::SystemCatalog;
use siteboot_core::VersionInfo;
use siteboot_store_sqlite::SqliteSiteStore;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Site system backed by the `SQLite` store.
pub type SqliteSiteSystem = SiteSystem<SqliteSiteStore>;

/// Bootstrap errors.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
}

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Loads configuration from `path` (or the default resolution rules) and
/// builds a site system.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration cannot be loaded or the
/// store cannot be opened.
pub fn load(path: Option<&Path>) -> Result<SqliteSiteSystem, BootstrapError> {
    let config = SitebootConfig::load(path).map_err(|err| BootstrapError::Config(err.to_string()))?;
    from_config(&config)
}

/// Builds a site system from `config`, using the configured event sink.
///
/// # Errors
///
/// Returns [`BootstrapError`] when validation fails, the sink cannot be
/// opened, or the store cannot be opened.
pub fn from_config(config: &SitebootConfig) -> Result<SqliteSiteSystem, BootstrapError> {
    config.validate().map_err(|err| BootstrapError::Config(err.to_string()))?;
    let events = build_event_sink(&config.events)?;
    from_config_with_events(config, events)
}

/// Builds a site system from `config` with a caller-supplied event sink.
///
/// # Errors
///
/// Returns [`BootstrapError`] when validation fails or the store cannot be
/// opened.
pub fn from_config_with_events(
    config: &SitebootConfig,
    events: Arc<dyn SiteEventSink>,
) -> Result<SqliteSiteSystem, BootstrapError> {
    config.validate().map_err(|err| BootstrapError::Config(err.to_string()))?;
    let versions = VersionInfo::discover(&config.version_sources(), events.as_ref());
    let store = SqliteSiteStore::new(config.store.clone())
        .map_err(|err| BootstrapError::Init(err.to_string()))?;
    Ok(SiteSystem::new(Arc::new(store), SystemCatalog::builtin(), versions, events))
}

/// Builds the event sink selected by `[events]`.
///
/// # Errors
///
/// Returns [`BootstrapError`] when the file sink cannot be opened.
pub fn build_event_sink(config: &EventsConfig) -> Result<Arc<dyn SiteEventSink>, BootstrapError> {
    match config.sink {
        EventSinkKind::Stderr => Ok(Arc::new(StderrEventSink)),
        EventSinkKind::None => Ok(Arc::new(NoopEventSink)),
        EventSinkKind::File => {
            let path = config.path.as_deref().ok_or_else(|| {
                BootstrapError::Config("events.path is required for the file sink".to_string())
            })?;
            let sink = FileEventSink::new(path).map_err(|err| {
                BootstrapError::Init(format!("event sink {}: {err}", path.display()))
            })?;
            Ok(Arc::new(sink))
        }
    }
}
