// crates/siteboot-core/tests/support/mod.rs
// ============================================================================
// Module: Test Support
// Description: Shared helpers and an in-memory persistence fake.
// ============================================================================
//! ## Overview
//! Result helpers, a recording event sink, and [`MemoryPersistence`], which
//! models table schemas, sites, the config record and administrator writes
//! with an operation log and failure injection.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    dead_code,
    reason = "Test-only helpers; not every test binary uses every helper."
)]

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::Mutex;

use siteboot_core::AdministratorRecord;
use siteboot_core::AdministratorStore;
use siteboot_core::AlterPlan;
use siteboot_core::CacheControl;
use siteboot_core::ColumnDescriptor;
use siteboot_core::ConfigRecord;
use siteboot_core::ConfigStore;
use siteboot_core::ExistingColumn;
use siteboot_core::SchemaStore;
use siteboot_core::SiteDescriptor;
use siteboot_core::SiteEvent;
use siteboot_core::SiteEventKind;
use siteboot_core::SiteEventSink;
use siteboot_core::SiteStore;
use siteboot_core::StoreError;
use siteboot_core::TableDescriptor;
use siteboot_core::catalog::SITE_TABLE;
use siteboot_core::catalog::site_table;
use siteboot_core::plan_alteration;

// ========================================================================
// Test Result Helpers
// ========================================================================

/// Standard result type used across core integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// Lightweight error type for test assertions.
#[derive(Debug)]
struct TestError {
    /// Human-readable failure message.
    message: String,
}

impl fmt::Display for TestError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.message)
    }
}

impl Error for TestError {}

/// Returns an error when a test condition fails.
///
/// # Errors
/// Returns a `TestError` when the condition is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Box::new(TestError {
            message: message.into(),
        }))
    }
}

// ========================================================================
// Recording Event Sink
// ========================================================================

/// Event sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingEventSink {
    /// Recorded events.
    events: Mutex<Vec<SiteEvent>>,
}

impl RecordingEventSink {
    /// Returns recorded event kinds in order.
    pub fn kinds(&self) -> Vec<SiteEventKind> {
        self.events.lock().unwrap().iter().map(|event| event.kind).collect()
    }

    /// Returns recorded events of `kind`.
    pub fn of_kind(&self, kind: SiteEventKind) -> Vec<SiteEvent> {
        self.events.lock().unwrap().iter().filter(|event| event.kind == kind).cloned().collect()
    }
}

impl SiteEventSink for RecordingEventSink {
    fn record(&self, event: &SiteEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ========================================================================
// Memory Persistence
// ========================================================================

/// Mutable state behind [`MemoryPersistence`].
#[derive(Default)]
pub struct MemoryState {
    /// Live tables and their columns.
    pub tables: BTreeMap<String, Vec<ExistingColumn>>,
    /// Sites in store order.
    pub sites: Vec<SiteDescriptor>,
    /// Config record.
    pub config: Option<ConfigRecord>,
    /// Administrator accounts.
    pub administrators: Vec<AdministratorRecord>,
    /// Role memberships as `(user, role)`.
    pub roles: Vec<(String, String)>,
    /// Operation log.
    pub ops: Vec<String>,
    /// Table whose creation fails.
    pub fail_create: Option<String>,
    /// Whether administrator inserts fail.
    pub fail_admin: bool,
    /// Whether site reads fail.
    pub fail_sites: bool,
    /// Number of config inserts.
    pub config_inserts: usize,
    /// Number of config updates.
    pub config_updates: usize,
}

/// In-memory persistence fake.
#[derive(Default)]
pub struct MemoryPersistence {
    /// Guarded state.
    pub state: Mutex<MemoryState>,
}

impl MemoryPersistence {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose site table already holds `sites`.
    pub fn with_sites(sites: Vec<SiteDescriptor>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            state.tables.insert(SITE_TABLE.to_string(), existing(&site_table()));
            state.sites = sites;
        }
        store
    }

    /// Runs `f` with the locked state.
    pub fn with_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        f(&mut self.state.lock().unwrap())
    }

    /// Returns the operation log.
    pub fn ops(&self) -> Vec<String> {
        self.with_state(|state| state.ops.clone())
    }

    /// Returns the live column names of `table`.
    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.with_state(|state| {
            state
                .tables
                .get(table)
                .map(|columns| columns.iter().map(|column| column.name.clone()).collect())
                .unwrap_or_default()
        })
    }
}

/// Converts descriptor columns into live columns.
pub fn existing(table: &TableDescriptor) -> Vec<ExistingColumn> {
    table.columns.iter().map(live_column).collect()
}

/// Converts one descriptor column into a live column.
fn live_column(column: &ColumnDescriptor) -> ExistingColumn {
    ExistingColumn {
        name: column.name.clone(),
        declared_type: column.data_type.declared_type(),
        is_primary_key: column.is_primary_key,
    }
}

/// Finds the stored spelling of `table_name`, ignoring ASCII case like `SQLite`.
fn stored_table_name(state: &MemoryState, table_name: &str) -> Option<String> {
    state.tables.keys().find(|name| name.eq_ignore_ascii_case(table_name)).cloned()
}

impl SchemaStore for MemoryPersistence {
    fn table_exists(&self, table_name: &str) -> Result<bool, StoreError> {
        self.with_state(|state| {
            state.ops.push(format!("exists:{table_name}"));
            Ok(stored_table_name(state, table_name).is_some())
        })
    }

    fn create_table(&self, table: &TableDescriptor) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.ops.push(format!("create:{}", table.name));
            if state.fail_create.as_deref() == Some(table.name.as_str()) {
                return Err(StoreError::Db(format!("cannot create {}", table.name)));
            }
            state.tables.insert(table.name.clone(), existing(table));
            Ok(())
        })
    }

    fn alter_table(
        &self,
        table: &TableDescriptor,
        drop_columns: &[&str],
    ) -> Result<AlterPlan, StoreError> {
        self.with_state(|state| {
            let Some(columns) = stored_table_name(state, &table.name)
                .and_then(|stored| state.tables.get_mut(&stored))
            else {
                return Err(StoreError::NotFound(table.name.clone()));
            };
            let plan = plan_alteration(columns, table, drop_columns);
            columns.retain(|column| {
                !plan.drop.iter().any(|dropped| dropped.eq_ignore_ascii_case(&column.name))
            });
            for retyped in &plan.retype {
                for column in columns.iter_mut() {
                    if column.name.eq_ignore_ascii_case(&retyped.name) {
                        column.declared_type = retyped.data_type.declared_type();
                    }
                }
            }
            columns.extend(plan.add.iter().map(live_column));
            state.ops.push(format!("alter:{}", table.name));
            Ok(plan)
        })
    }
}

impl SiteStore for MemoryPersistence {
    fn all_sites(&self) -> Result<Vec<SiteDescriptor>, StoreError> {
        self.with_state(|state| {
            state.ops.push("sites".to_string());
            if state.fail_sites {
                return Err(StoreError::Db("site read failed".to_string()));
            }
            if !state.tables.contains_key(SITE_TABLE) {
                return Ok(Vec::new());
            }
            Ok(state.sites.clone())
        })
    }

    fn all_content_table_names(&self) -> Result<Vec<String>, StoreError> {
        self.with_state(|state| {
            state.ops.push("content_tables".to_string());
            if !state.tables.contains_key(SITE_TABLE) {
                return Ok(Vec::new());
            }
            let mut names: Vec<String> =
                state.sites.iter().map(|site| site.table_name.clone()).collect();
            names.sort();
            names.dedup();
            Ok(names)
        })
    }
}

impl ConfigStore for MemoryPersistence {
    fn config_record(&self) -> Result<Option<ConfigRecord>, StoreError> {
        self.with_state(|state| Ok(state.config.clone()))
    }

    fn insert_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.ops.push("config_insert".to_string());
            state.config_inserts += 1;
            let mut stored = record.clone();
            stored.id = 1;
            state.config = Some(stored);
            Ok(())
        })
    }

    fn update_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.ops.push("config_update".to_string());
            state.config_updates += 1;
            state.config = Some(record.clone());
            Ok(())
        })
    }
}

impl AdministratorStore for MemoryPersistence {
    fn insert_administrator(&self, record: &AdministratorRecord) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.ops.push(format!("admin:{}", record.user_name));
            if state.fail_admin {
                return Err(StoreError::Db("administrator insert failed".to_string()));
            }
            if state.administrators.iter().any(|admin| admin.user_name == record.user_name) {
                return Err(StoreError::Conflict(record.user_name.clone()));
            }
            state.administrators.push(record.clone());
            Ok(())
        })
    }

    fn add_user_to_role(&self, user_name: &str, role_name: &str) -> Result<(), StoreError> {
        self.with_state(|state| {
            state.ops.push(format!("role:{user_name}:{role_name}"));
            let entry = (user_name.to_string(), role_name.to_string());
            if !state.roles.contains(&entry) {
                state.roles.push(entry);
            }
            Ok(())
        })
    }
}

impl CacheControl for MemoryPersistence {
    fn clear_all_caches(&self) {
        self.with_state(|state| state.ops.push("clear_caches".to_string()));
    }
}
