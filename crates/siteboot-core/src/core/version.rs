// crates/siteboot-core/src/core/version.rs
// ============================================================================
// Module: Siteboot Version Metadata
// Description: Product, plugin and runtime version strings.
// Purpose: Expose informational version data and the product version used
//          for update checks.
// Dependencies: crate::events
// ============================================================================

//! ## Overview
//! Version metadata is discovered once at startup. Discovery never fails:
//! unreadable sources are recorded as `metadata_unavailable` events and the
//! compiled defaults are used instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;

use crate::events::SiteEvent;
use crate::events::SiteEventKind;
use crate::events::SiteEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Product version compiled into this build.
pub const COMPILED_PRODUCT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Maximum bytes read from a version file.
const MAX_VERSION_FILE_BYTES: u64 = 256;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Optional overrides and sources for version discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSources {
    /// Explicit product version; wins over the version file.
    pub product_version: Option<String>,
    /// Plugin API version.
    pub plugin_version: Option<String>,
    /// File whose trimmed contents supply the product version.
    pub version_file: Option<PathBuf>,
}

/// Read-only version strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    /// Product version compared against the persisted database version.
    pub product_version: String,
    /// Plugin API version, empty when unknown.
    pub plugin_version: String,
    /// Build target label (`arch-os`).
    pub build_target: String,
    /// Minimum supported Rust toolchain.
    pub runtime_version: String,
}

impl VersionInfo {
    /// Returns version metadata using compiled defaults only.
    #[must_use]
    pub fn compiled() -> Self {
        Self {
            product_version: COMPILED_PRODUCT_VERSION.to_string(),
            plugin_version: String::new(),
            build_target: format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS),
            runtime_version: option_env!("CARGO_PKG_RUST_VERSION").unwrap_or_default().to_string(),
        }
    }

    /// Returns version metadata with an explicit product version.
    #[must_use]
    pub fn with_product_version(product_version: impl Into<String>) -> Self {
        Self {
            product_version: product_version.into(),
            ..Self::compiled()
        }
    }

    /// Discovers version metadata from `sources`, logging unreadable sources.
    #[must_use]
    pub fn discover(sources: &VersionSources, events: &dyn SiteEventSink) -> Self {
        let mut info = Self::compiled();
        if let Some(plugin_version) = &sources.plugin_version {
            info.plugin_version.clone_from(plugin_version);
        }
        if let Some(product_version) = &sources.product_version {
            info.product_version.clone_from(product_version);
            return info;
        }
        if let Some(path) = &sources.version_file {
            match read_version_file(path) {
                Ok(version) => info.product_version = version,
                Err(message) => events.record(
                    &SiteEvent::new(SiteEventKind::MetadataUnavailable)
                        .with_detail(format!("{}: {message}", path.display())),
                ),
            }
        }
        info
    }
}

/// Reads and trims a version file.
fn read_version_file(path: &Path) -> Result<String, String> {
    let metadata = fs::metadata(path).map_err(|err| err.to_string())?;
    if metadata.len() > MAX_VERSION_FILE_BYTES {
        return Err("version file exceeds size limit".to_string());
    }
    let content = fs::read_to_string(path).map_err(|err| err.to_string())?;
    let version = content.trim();
    if version.is_empty() {
        return Err("version file is empty".to_string());
    }
    Ok(version.to_string())
}
