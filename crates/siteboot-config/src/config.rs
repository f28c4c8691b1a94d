// crates/siteboot-config/src/config.rs
// ============================================================================
// Module: Siteboot Configuration
// Description: Configuration loading and validation for siteboot.
// Purpose: Reject oversized, malformed or inconsistent config before startup.
// Dependencies: siteboot-core, siteboot-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `siteboot.toml` is read under hard size and path limits.
//! The path comes from the caller, then the `SITEBOOT_CONFIG` environment
//! variable, then `siteboot.toml` in the working directory.
//!
//! ```toml
//! [store]
//! path = "data/site.sqlite"
//! journal_mode = "wal"
//!
//! [versions]
//! product_version = "7.2.0"
//!
//! [events]
//! sink = "file"
//! path = "logs/siteboot.jsonl"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use siteboot_core::VersionSources;
use siteboot_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Config file looked up in the working directory when no path is given.
const DEFAULT_CONFIG_NAME: &str = "siteboot.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "SITEBOOT_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;
/// Per-component path length limit.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Total path length limit.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a configured version string.
pub const MAX_VERSION_LENGTH: usize = 64;

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level siteboot configuration.
///
/// # Invariants
/// - A loaded config has passed [`SitebootConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SitebootConfig {
    /// Persistence backend configuration.
    pub store: SqliteStoreConfig,
    /// Version overrides and sources.
    #[serde(default)]
    pub versions: VersionConfig,
    /// Structured event output.
    #[serde(default)]
    pub events: EventsConfig,
}

impl SitebootConfig {
    /// Resolves, reads, parses and validates the config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path);
        check_path_limits("config path", &resolved)?;
        let bytes = read_bounded(&resolved)?;
        let content = String::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section; called by [`SitebootConfig::load`] and by the
    /// bootstrap for configs built in code.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        self.versions.validate()?;
        self.events.validate()?;
        Ok(())
    }

    /// Returns the version discovery sources described by `[versions]`.
    #[must_use]
    pub fn version_sources(&self) -> VersionSources {
        VersionSources {
            product_version: self.versions.product_version.clone(),
            plugin_version: self.versions.plugin_version.clone(),
            version_file: self.versions.version_file.clone(),
        }
    }
}

/// Version overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionConfig {
    /// Explicit product version; wins over `version_file`.
    #[serde(default)]
    pub product_version: Option<String>,
    /// Plugin API version.
    #[serde(default)]
    pub plugin_version: Option<String>,
    /// File whose trimmed contents supply the product version.
    #[serde(default)]
    pub version_file: Option<PathBuf>,
}

impl VersionConfig {
    /// Validates version strings and the version file path.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(version) = &self.product_version {
            validate_version_string("versions.product_version", version)?;
        }
        if let Some(version) = &self.plugin_version {
            validate_version_string("versions.plugin_version", version)?;
        }
        if let Some(path) = &self.version_file {
            validate_path_string("versions.version_file", &path.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `events.path`.
    File,
    /// Discard events.
    None,
}

/// Structured event output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: EventSinkKind,
    /// Output file for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl EventsConfig {
    /// Validates sink/path consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (EventSinkKind::File, None) => {
                Err(ConfigError::Invalid("events.path is required for the file sink".to_string()))
            }
            (_, Some(path)) => validate_path_string("events.path", &path.to_string_lossy()),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading `siteboot.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be opened or read.
    #[error("config io error: {0}")]
    Io(String),
    /// The file is not valid TOML for the config model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A guard or field validation failed.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Picks the caller's path, then `SITEBOOT_CONFIG`, then the default name.
fn resolve_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Rejects paths over the total or per-component length limits.
fn check_path_limits(label: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} exceeds max length")));
    }
    if path.components().any(|component| component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH)
    {
        return Err(ConfigError::Invalid(format!("{label} component too long")));
    }
    Ok(())
}

/// Reads at most one byte past [`MAX_CONFIG_FILE_SIZE`].
fn read_bounded(path: &Path) -> Result<Vec<u8>, ConfigError> {
    let file = File::open(path).map_err(|err| ConfigError::Io(err.to_string()))?;
    let mut bytes = Vec::new();
    file.take(MAX_CONFIG_FILE_SIZE + 1)
        .read_to_end(&mut bytes)
        .map_err(|err| ConfigError::Io(err.to_string()))?;
    if u64::try_from(bytes.len()).unwrap_or(u64::MAX) > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    Ok(bytes)
}

/// Validates a configured path field after trimming.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    check_path_limits(field, Path::new(trimmed))
}

/// Validates the `[store]` table.
fn validate_store(store: &SqliteStoreConfig) -> Result<(), ConfigError> {
    validate_path_string("store.path", &store.path.to_string_lossy())?;
    if store.path.is_dir() {
        return Err(ConfigError::Invalid("store.path must be a file, not a directory".to_string()));
    }
    if store.busy_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "store.busy_timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Validates a configured version string.
fn validate_version_string(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_VERSION_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if value.chars().any(char::is_control) {
        return Err(ConfigError::Invalid(format!("{field} contains control characters")));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::ConfigError;
    use super::validate_path_string;
    use super::validate_version_string;

    #[test]
    fn validate_path_string_trims_before_validation() {
        assert!(validate_path_string("field", "  data/site.sqlite  ").is_ok());
        assert!(matches!(validate_path_string("field", "   "), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let value = format!("data/{}", "a".repeat(256));
        let Err(err) = validate_path_string("store.path", &value) else {
            panic!("expected overlong component to fail");
        };
        assert!(err.to_string().contains("store.path component too long"));
    }

    #[test]
    fn version_strings_reject_control_characters_and_overlong_values() {
        assert!(validate_version_string("v", "7.2.0").is_ok());
        assert!(validate_version_string("v", "7.2\u{0}").is_err());
        assert!(validate_version_string("v", &"9".repeat(65)).is_err());
        assert!(validate_version_string("v", " ").is_err());
    }
}
