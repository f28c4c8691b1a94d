// crates/siteboot-core/src/events.rs
// ============================================================================
// Module: Siteboot Events
// Description: Structured events for installation, sync and registry refresh.
// Purpose: Emit JSON-line logs without hard dependencies on a logging stack.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every notable step of schema sync, installation and registry refresh is
//! reported as a [`SiteEvent`]. Sinks decide where events go; deployments can
//! route them to stderr, an append-only file, or drop them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Event classification.
///
/// # Invariants
/// - Serialized labels are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteEventKind {
    /// Persistence caches were cleared ahead of a sync.
    CachesCleared,
    /// A missing table was created.
    TableCreated,
    /// An existing table was altered.
    TableAltered,
    /// An existing table already matched its descriptor.
    TableUnchanged,
    /// A descriptor without name or columns was skipped.
    TableSkipped,
    /// The config version stamp was written.
    ConfigStamped,
    /// Installed state was confirmed for this process.
    InstallConfirmed,
    /// A new registry snapshot was published.
    RegistryRefreshed,
    /// A routing key was already claimed by an earlier site.
    DomainCollision,
    /// A site directory could not be indexed.
    DirectoryRejected,
    /// The bootstrap administrator was created.
    AdministratorCreated,
    /// Startup metadata could not be read.
    MetadataUnavailable,
}

/// Structured event payload.
///
/// # Invariants
/// - Optional fields are `None` when they do not apply to the event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event classification.
    pub kind: SiteEventKind,
    /// Table the event refers to.
    pub table: Option<String>,
    /// Site directory the event refers to.
    pub site_dir: Option<String>,
    /// Routing key the event refers to.
    pub domain: Option<String>,
    /// Item count (tables, sites) when relevant.
    pub count: Option<usize>,
    /// Free-form detail.
    pub detail: Option<String>,
}

impl SiteEvent {
    /// Creates an event of `kind` with a consistent timestamp.
    #[must_use]
    pub fn new(kind: SiteEventKind) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "siteboot",
            timestamp_ms,
            kind,
            table: None,
            site_dir: None,
            domain: None,
            count: None,
            detail: None,
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the site directory.
    #[must_use]
    pub fn with_site_dir(mut self, site_dir: impl Into<String>) -> Self {
        self.site_dir = Some(site_dir.into());
        self
    }

    /// Sets the routing key.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the item count.
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the detail text.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Sink for siteboot events.
pub trait SiteEventSink: Send + Sync {
    /// Record an event.
    fn record(&self, event: &SiteEvent);
}

/// Event sink that logs JSON lines to stderr.
pub struct StderrEventSink;

impl SiteEventSink for StderrEventSink {
    fn record(&self, event: &SiteEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Event sink that logs JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the event log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl SiteEventSink for FileEventSink {
    fn record(&self, event: &SiteEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op event sink.
pub struct NoopEventSink;

impl SiteEventSink for NoopEventSink {
    fn record(&self, _event: &SiteEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
