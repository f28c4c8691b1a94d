// crates/siteboot-core/src/core/site.rs
// ============================================================================
// Module: Siteboot Site Model
// Description: Site descriptors as persisted by the site table.
// Purpose: Provide the read-only site records consumed by the site registry.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`SiteDescriptor`] identifies one logical site: its directory name, whether
//! it is the root (default) site, and the `;`-delimited domain names bound to
//! it. Descriptors are owned by the persistence layer; the registry only keeps
//! shared read-only copies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delimiter between domain names in [`SiteDescriptor::domain_names`].
pub const DOMAIN_DELIMITER: char = ';';
/// Delimiter between directory names in the registry directory index.
pub const DIRECTORY_DELIMITER: char = '|';
/// Content table used by sites that do not name their own.
pub const DEFAULT_CONTENT_TABLE: &str = "cms_content";

// ============================================================================
// SECTION: Site Descriptor
// ============================================================================

/// Persisted record describing one logical website.
///
/// # Invariants
/// - `site_dir` is expected not to contain [`DIRECTORY_DELIMITER`]; the
///   registry excludes offending directories from its index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteDescriptor {
    /// Site identifier assigned by the store.
    pub id: i64,
    /// Directory name of the site.
    pub site_dir: String,
    /// Display name of the site.
    pub site_name: String,
    /// Content table holding the site's content rows.
    pub table_name: String,
    /// Whether this is the root/default site.
    pub is_root: bool,
    /// `;`-delimited list of bound domain names.
    pub domain_names: String,
}

impl SiteDescriptor {
    /// Creates a non-root site with no bound domains.
    #[must_use]
    pub fn new(id: i64, site_dir: impl Into<String>) -> Self {
        let site_dir = site_dir.into();
        Self {
            id,
            site_name: site_dir.clone(),
            site_dir,
            table_name: DEFAULT_CONTENT_TABLE.to_string(),
            is_root: false,
            domain_names: String::new(),
        }
    }

    /// Marks the site as the root site.
    #[must_use]
    pub const fn as_root(mut self) -> Self {
        self.is_root = true;
        self
    }

    /// Sets the raw `;`-delimited domain list.
    #[must_use]
    pub fn with_domains(mut self, domain_names: impl Into<String>) -> Self {
        self.domain_names = domain_names.into();
        self
    }

    /// Sets the content table name.
    #[must_use]
    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Returns the normalized, non-empty domain names bound to the site.
    pub fn domains(&self) -> impl Iterator<Item = String> + '_ {
        self.domain_names.split(DOMAIN_DELIMITER).map(normalize_host).filter(|host| !host.is_empty())
    }
}

/// Normalizes a host name for routing: trims whitespace and lowercases ASCII.
#[must_use]
pub fn normalize_host(host: &str) -> String {
    host.trim().to_ascii_lowercase()
}
