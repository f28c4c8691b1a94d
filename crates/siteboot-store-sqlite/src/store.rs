// crates/siteboot-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Site Store
// Description: Durable persistence contracts backed by SQLite.
// Purpose: Create and alter tables, read sites and persist the config record.
// Dependencies: siteboot-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteSiteStore`] implements the `siteboot-core` persistence traits over
//! one serialized `SQLite` connection.
//!
//! Schema changes use in-place `ALTER TABLE ... ADD COLUMN` and
//! `ALTER TABLE ... DROP COLUMN` where possible. Column retypes and added
//! primary keys need a table rebuild: a replacement table is created, shared
//! columns are copied across, the old table is dropped and the replacement
//! renamed. Each alteration runs in one transaction.
//!
//! Table and column names are validated with
//! [`siteboot_core::validate_identifier`] and quoted before being spliced
//! into SQL; every value goes through bound parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde::Deserialize;
use siteboot_core::AdministratorRecord;
use siteboot_core::AdministratorStore;
use siteboot_core::AlterPlan;
use siteboot_core::CacheControl;
use siteboot_core::ColumnDescriptor;
use siteboot_core::ConfigRecord;
use siteboot_core::ConfigStore;
use siteboot_core::ExistingColumn;
use siteboot_core::PasswordFormat;
use siteboot_core::SchemaStore;
use siteboot_core::SiteDescriptor;
use siteboot_core::SiteStore;
use siteboot_core::StoreError;
use siteboot_core::TableDescriptor;
use siteboot_core::catalog::ADMINISTRATOR_ROLE_TABLE;
use siteboot_core::catalog::ADMINISTRATOR_TABLE;
use siteboot_core::catalog::CONFIG_TABLE;
use siteboot_core::catalog::SITE_TABLE;
use siteboot_core::plan_alteration;
use siteboot_core::validate_identifier;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Busy timeout applied when `[store]` omits one.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Per-component path length limit.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Total path length limit.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Suffix for the replacement table used during rebuilds.
const REBUILD_SUFFIX: &str = "__rebuild";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Journal mode applied when the store opens.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// Write-ahead log; readers do not block the sync writer.
    #[default]
    Wal,
    /// Rollback journal deleted after each transaction.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `synchronous` pragma applied when the store opens.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Sync on every commit.
    #[default]
    Full,
    /// Sync at checkpoints only.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` site store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds and must be non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding password digests or salts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid configuration, identifier or stored data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Referenced table or row is missing.
    #[error("sqlite store not found: {0}")]
    NotFound(String),
    /// Unique key already taken.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::NotFound(message) => Self::NotFound(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed implementation of every siteboot persistence contract.
///
/// # Invariants
/// - All statements run on one connection guarded by a mutex.
/// - The column cache only holds shapes read since the last schema change.
pub struct SqliteSiteStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Serialized connection.
    connection: Mutex<Connection>,
    /// Live column shapes keyed by table name.
    column_cache: Mutex<BTreeMap<String, Vec<ExistingColumn>>>,
}

impl SqliteSiteStore {
    /// Opens an `SQLite`-backed site store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unusable or the database
    /// cannot be opened.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        if config.busy_timeout_ms == 0 {
            return Err(SqliteStoreError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        ensure_parent_dir(&config.path)?;
        let connection = open_connection(&config)?;
        Ok(Self {
            config,
            connection: Mutex::new(connection),
            column_cache: Mutex::new(BTreeMap::new()),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite connection mutex poisoned".to_string()))
    }

    /// Locks the column cache, recovering from poisoning since it is advisory.
    fn cache(&self) -> MutexGuard<'_, BTreeMap<String, Vec<ExistingColumn>>> {
        self.column_cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns live columns for `table_name`, using the cache when warm.
    fn live_columns(
        &self,
        connection: &Connection,
        table_name: &str,
    ) -> Result<Vec<ExistingColumn>, SqliteStoreError> {
        let key = cache_key(table_name);
        if let Some(columns) = self.cache().get(&key) {
            return Ok(columns.clone());
        }
        let columns = read_table_info(connection, table_name)?;
        self.cache().insert(key, columns.clone());
        Ok(columns)
    }

    /// Inserts a site row and returns its identifier. `id` on the descriptor
    /// is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::NotFound`] when the site table has not been
    /// created yet, or [`SqliteStoreError::Db`] when the insert fails.
    pub fn insert_site(&self, site: &SiteDescriptor) -> Result<i64, SqliteStoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, SITE_TABLE)? {
            return Err(SqliteStoreError::NotFound(SITE_TABLE.to_string()));
        }
        connection
            .execute(
                &format!(
                    "INSERT INTO {table} (site_dir, site_name, table_name, is_root, parent_id, \
                     taxis, domain_names) VALUES (?1, ?2, ?3, ?4, 0, \
                     (SELECT COALESCE(MAX(taxis), 0) + 1 FROM {table}), ?5)",
                    table = quote_identifier(SITE_TABLE)
                ),
                params![
                    site.site_dir,
                    site.site_name,
                    site.table_name,
                    site.is_root,
                    site.domain_names
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(connection.last_insert_rowid())
    }

    /// Loads an administrator account by name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the row cannot be read or carries an
    /// unknown password format.
    pub fn administrator(
        &self,
        user_name: &str,
    ) -> Result<Option<AdministratorRecord>, SqliteStoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, ADMINISTRATOR_TABLE)? {
            return Ok(None);
        }
        let row: Option<(String, String, String, String, i64)> = connection
            .query_row(
                &format!(
                    "SELECT user_name, password, password_format, password_salt, created_at_ms \
                     FROM {} WHERE user_name = ?1",
                    quote_identifier(ADMINISTRATOR_TABLE)
                ),
                params![user_name],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let Some((user_name, password_hash, format, password_salt, created_at_ms)) = row else {
            return Ok(None);
        };
        let password_format = PasswordFormat::parse(&format).ok_or_else(|| {
            SqliteStoreError::Invalid(format!("unknown password format: {format}"))
        })?;
        Ok(Some(AdministratorRecord {
            user_name,
            password_hash,
            password_salt,
            password_format,
            created_at_ms,
        }))
    }

    /// Returns the roles granted to `user_name`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when memberships cannot be read.
    pub fn roles_for_user(&self, user_name: &str) -> Result<Vec<String>, SqliteStoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, ADMINISTRATOR_ROLE_TABLE)? {
            return Ok(Vec::new());
        }
        let mut statement = connection
            .prepare(&format!(
                "SELECT role_name FROM {} WHERE user_name = ?1 ORDER BY role_name",
                quote_identifier(ADMINISTRATOR_ROLE_TABLE)
            ))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![user_name], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(|err| SqliteStoreError::Db(err.to_string()))
    }

    /// Returns the live column shapes of `table_name`, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the table cannot be inspected.
    pub fn table_columns(&self, table_name: &str) -> Result<Vec<ExistingColumn>, SqliteStoreError> {
        let connection = self.lock()?;
        read_table_info(&connection, table_name)
    }

    /// Creates `table` on a locked connection.
    fn create_table_locked(
        &self,
        connection: &Connection,
        table: &TableDescriptor,
    ) -> Result<(), SqliteStoreError> {
        let sql = create_table_sql(&table.name, &table.columns, &[])?;
        connection.execute_batch(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        self.cache().remove(&cache_key(&table.name));
        Ok(())
    }

    /// Applies `plan` to an existing table inside one transaction.
    fn alter_table_locked(
        &self,
        connection: &mut Connection,
        table: &TableDescriptor,
        drop_columns: &[&str],
    ) -> Result<AlterPlan, SqliteStoreError> {
        validate_table(table)?;
        let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if !table_exists(&tx, &table.name)? {
            return Err(SqliteStoreError::NotFound(table.name.clone()));
        }
        let live = self.live_columns(&tx, &table.name)?;
        let plan = plan_alteration(&live, table, drop_columns);
        if plan.is_empty() {
            return Ok(plan);
        }
        if plan.requires_rebuild() {
            rebuild_table(&tx, table, &live, &plan)?;
        } else {
            let quoted_table = quote_identifier(&table.name);
            for column in &plan.add {
                tx.execute_batch(&format!(
                    "ALTER TABLE {quoted_table} ADD COLUMN {};",
                    column_definition(column)
                ))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
            for name in &plan.drop {
                validate_name(name)?;
                tx.execute_batch(&format!(
                    "ALTER TABLE {quoted_table} DROP COLUMN {};",
                    quote_identifier(name)
                ))
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        self.cache().remove(&cache_key(&table.name));
        Ok(plan)
    }
}

// ============================================================================
// SECTION: Schema Store
// ============================================================================

impl SchemaStore for SqliteSiteStore {
    fn table_exists(&self, table_name: &str) -> Result<bool, StoreError> {
        let connection = self.lock()?;
        Ok(table_exists(&connection, table_name)?)
    }

    fn create_table(&self, table: &TableDescriptor) -> Result<(), StoreError> {
        validate_table(table)?;
        let connection = self.lock()?;
        Ok(self.create_table_locked(&connection, table)?)
    }

    fn alter_table(
        &self,
        table: &TableDescriptor,
        drop_columns: &[&str],
    ) -> Result<AlterPlan, StoreError> {
        let mut connection = self.lock()?;
        Ok(self.alter_table_locked(&mut connection, table, drop_columns)?)
    }
}

// ============================================================================
// SECTION: Site Store
// ============================================================================

impl SiteStore for SqliteSiteStore {
    fn all_sites(&self) -> Result<Vec<SiteDescriptor>, StoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, SITE_TABLE)? {
            return Ok(Vec::new());
        }
        let mut statement = connection
            .prepare(&format!(
                "SELECT id, site_dir, site_name, table_name, is_root, domain_names FROM {} \
                 ORDER BY taxis, id",
                quote_identifier(SITE_TABLE)
            ))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map([], |row| {
                Ok(SiteDescriptor {
                    id: row.get(0)?,
                    site_dir: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    site_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    table_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    is_root: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
                    domain_names: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                })
            })
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let sites = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(sites)
    }

    fn all_content_table_names(&self) -> Result<Vec<String>, StoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, SITE_TABLE)? {
            return Ok(Vec::new());
        }
        let mut statement = connection
            .prepare(&format!(
                "SELECT MIN(TRIM(table_name)) FROM {} WHERE table_name IS NOT NULL \
                 AND TRIM(table_name) <> '' GROUP BY LOWER(TRIM(table_name)) ORDER BY 1",
                quote_identifier(SITE_TABLE)
            ))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let names = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(names)
    }
}

// ============================================================================
// SECTION: Config Store
// ============================================================================

impl ConfigStore for SqliteSiteStore {
    fn config_record(&self) -> Result<Option<ConfigRecord>, StoreError> {
        let connection = self.lock()?;
        if !table_exists(&connection, CONFIG_TABLE)? {
            return Ok(None);
        }
        let record = connection
            .query_row(
                &format!(
                    "SELECT id, is_initialized, database_version, updated_at_ms, system_config \
                     FROM {} ORDER BY id LIMIT 1",
                    quote_identifier(CONFIG_TABLE)
                ),
                params![],
                |row| {
                    Ok(ConfigRecord {
                        id: row.get(0)?,
                        is_initialized: row.get::<_, Option<bool>>(1)?.unwrap_or(false),
                        database_version: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                        updated_at_ms: row.get::<_, Option<i64>>(3)?.unwrap_or_default(),
                        system_config: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    })
                },
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(record)
    }

    fn insert_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        let connection = self.lock()?;
        connection
            .execute(
                &format!(
                    "INSERT INTO {} (is_initialized, database_version, updated_at_ms, \
                     system_config) VALUES (?1, ?2, ?3, ?4)",
                    quote_identifier(CONFIG_TABLE)
                ),
                params![
                    record.is_initialized,
                    record.database_version,
                    record.updated_at_ms,
                    record.system_config
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn update_config_record(&self, record: &ConfigRecord) -> Result<(), StoreError> {
        let connection = self.lock()?;
        let updated = connection
            .execute(
                &format!(
                    "UPDATE {} SET is_initialized = ?1, database_version = ?2, \
                     updated_at_ms = ?3, system_config = ?4 WHERE id = ?5",
                    quote_identifier(CONFIG_TABLE)
                ),
                params![
                    record.is_initialized,
                    record.database_version,
                    record.updated_at_ms,
                    record.system_config,
                    record.id
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if updated == 0 {
            return Err(SqliteStoreError::NotFound(format!("config record {}", record.id)).into());
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Administrator Store
// ============================================================================

impl AdministratorStore for SqliteSiteStore {
    fn insert_administrator(&self, record: &AdministratorRecord) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let table = quote_identifier(ADMINISTRATOR_TABLE);
        let taken: Option<i64> = tx
            .query_row(
                &format!("SELECT 1 FROM {table} WHERE user_name = ?1"),
                params![record.user_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if taken.is_some() {
            return Err(SqliteStoreError::Conflict(record.user_name.clone()).into());
        }
        tx.execute(
            &format!(
                "INSERT INTO {table} (user_name, password, password_format, password_salt, \
                 created_at_ms, last_activity_ms, is_locked_out, display_name, email) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5, 0, ?1, '')"
            ),
            params![
                record.user_name,
                record.password_hash,
                record.password_format.as_str(),
                record.password_salt,
                record.created_at_ms
            ],
        )
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }

    fn add_user_to_role(&self, user_name: &str, role_name: &str) -> Result<(), StoreError> {
        let connection = self.lock()?;
        let table = quote_identifier(ADMINISTRATOR_ROLE_TABLE);
        connection
            .execute(
                &format!(
                    "INSERT INTO {table} (role_name, user_name) SELECT ?1, ?2 WHERE NOT EXISTS \
                     (SELECT 1 FROM {table} WHERE role_name = ?1 AND user_name = ?2)"
                ),
                params![role_name, user_name],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Cache Control
// ============================================================================

impl CacheControl for SqliteSiteStore {
    fn clear_all_caches(&self) {
        self.cache().clear();
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Creates the database file's parent directory when it is missing.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    match path.parent() {
        None => Err(SqliteStoreError::Io("store path has no parent directory".to_string())),
        Some(parent) if parent.as_os_str().is_empty() || parent.is_dir() => Ok(()),
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
        }
    }
}

/// Rejects empty, overlong and directory paths before anything touches disk.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let problem = if path.as_os_str().is_empty() {
        Some("store path must not be empty")
    } else if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        Some("store path exceeds length limit")
    } else if path.components().any(|part| part.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH) {
        Some("store path contains an overlong component")
    } else if path.is_dir() {
        Some("store path must be a file, not a directory")
    } else {
        None
    };
    problem.map_or(Ok(()), |message| Err(SqliteStoreError::Invalid(message.to_string())))
}

/// Opens the database read-write (creating it) with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let connection = Connection::open_with_flags(
        &config.path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
    )
    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!(
            "PRAGMA journal_mode = {}; PRAGMA synchronous = {};",
            config.journal_mode.pragma_value(),
            config.sync_mode.pragma_value()
        ))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(connection)
}

/// Returns true when `table_name` is a table in the main schema. `SQLite`
/// resolves identifiers without regard to ASCII case, so the lookup does too.
fn table_exists(connection: &Connection, table_name: &str) -> Result<bool, SqliteStoreError> {
    let found: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            params![table_name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(found.is_some())
}

/// Column cache key; table names differing only in case share one entry.
fn cache_key(table_name: &str) -> String {
    table_name.to_ascii_lowercase()
}

/// Reads column shapes via `PRAGMA table_info`.
fn read_table_info(
    connection: &Connection,
    table_name: &str,
) -> Result<Vec<ExistingColumn>, SqliteStoreError> {
    validate_name(table_name)?;
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({})", quote_identifier(table_name)))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let rows = statement
        .query_map([], |row| {
            Ok(ExistingColumn {
                name: row.get(1)?,
                declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                is_primary_key: row.get::<_, i64>(5)? > 0,
            })
        })
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Validates one identifier.
fn validate_name(name: &str) -> Result<(), SqliteStoreError> {
    validate_identifier(name).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Validates a table descriptor's identifiers and key layout.
fn validate_table(table: &TableDescriptor) -> Result<(), SqliteStoreError> {
    validate_name(&table.name)?;
    if table.columns.is_empty() {
        return Err(SqliteStoreError::Invalid(format!("table {} has no columns", table.name)));
    }
    for column in &table.columns {
        validate_name(&column.name)?;
    }
    let identities = table.columns.iter().filter(|column| column.is_identity).count();
    let keys = table.columns.iter().filter(|column| column.is_primary_key).count();
    if identities > 1 || (identities == 1 && keys > 1) {
        return Err(SqliteStoreError::Invalid(format!(
            "table {} mixes an identity column with other key columns",
            table.name
        )));
    }
    Ok(())
}

/// Double-quotes a validated identifier.
fn quote_identifier(name: &str) -> String {
    format!("\"{name}\"")
}

/// Renders one column definition.
fn column_definition(column: &ColumnDescriptor) -> String {
    let name = quote_identifier(&column.name);
    if column.is_identity {
        return format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT");
    }
    format!("{name} {}", column.data_type.declared_type())
}

/// Renders a live column kept across a rebuild.
fn kept_column_definition(column: &ExistingColumn) -> Result<String, SqliteStoreError> {
    validate_name(&column.name)?;
    let declared = column.declared_type.trim();
    if !declared.chars().all(|ch| ch.is_ascii_alphanumeric() || " (),_".contains(ch)) {
        return Err(SqliteStoreError::Invalid(format!(
            "column {} has an unsupported declared type",
            column.name
        )));
    }
    let name = quote_identifier(&column.name);
    if declared.is_empty() { Ok(name) } else { Ok(format!("{name} {declared}")) }
}

/// Builds a `CREATE TABLE` statement for declared plus kept columns.
fn create_table_sql(
    table_name: &str,
    columns: &[ColumnDescriptor],
    kept: &[&ExistingColumn],
) -> Result<String, SqliteStoreError> {
    let mut definitions: Vec<String> = columns.iter().map(column_definition).collect();
    for column in kept {
        definitions.push(kept_column_definition(column)?);
    }
    let has_identity = columns.iter().any(|column| column.is_identity);
    let keys: Vec<String> = columns
        .iter()
        .filter(|column| column.is_primary_key)
        .map(|column| quote_identifier(&column.name))
        .collect();
    if !has_identity && !keys.is_empty() {
        definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
    }
    Ok(format!("CREATE TABLE {} ({});", quote_identifier(table_name), definitions.join(", ")))
}

/// Rebuilds a table through a replacement table, keeping shared data.
fn rebuild_table(
    connection: &Connection,
    table: &TableDescriptor,
    live: &[ExistingColumn],
    plan: &AlterPlan,
) -> Result<(), SqliteStoreError> {
    let is_dropped =
        |name: &str| plan.drop.iter().any(|dropped| dropped.eq_ignore_ascii_case(name));
    let kept: Vec<&ExistingColumn> = live
        .iter()
        .filter(|column| table.column(&column.name).is_none() && !is_dropped(&column.name))
        .collect();
    let shared: Vec<String> = live
        .iter()
        .filter(|column| !is_dropped(&column.name))
        .map(|column| quote_identifier(&column.name))
        .collect();
    let replacement = format!("{}{REBUILD_SUFFIX}", table.name);
    let quoted_replacement = quote_identifier(&replacement);
    let quoted_table = quote_identifier(&table.name);
    let columns = shared.join(", ");
    let sql = format!(
        "DROP TABLE IF EXISTS {quoted_replacement};\n{}\nINSERT INTO {quoted_replacement} \
         ({columns}) SELECT {columns} FROM {quoted_table};\nDROP TABLE {quoted_table};\nALTER \
         TABLE {quoted_replacement} RENAME TO {quoted_table};",
        create_table_sql(&replacement, &table.columns, &kept)?
    );
    connection.execute_batch(&sql).map_err(|err| SqliteStoreError::Db(err.to_string()))
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

    use siteboot_core::ColumnDescriptor;
    use siteboot_core::ColumnType;
    use siteboot_core::TableDescriptor;

    use super::create_table_sql;
    use super::validate_table;

    #[test]
    fn identity_column_is_inline_primary_key() {
        let sql = create_table_sql(
            "cms_demo",
            &[ColumnDescriptor::identity("id"), ColumnDescriptor::new("name", ColumnType::Text)],
            &[],
        )
        .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"cms_demo\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \"name\" TEXT);"
        );
    }

    #[test]
    fn composite_keys_use_table_constraint() {
        let sql = create_table_sql(
            "cms_pair",
            &[
                ColumnDescriptor::new("a", ColumnType::Integer).primary_key(),
                ColumnDescriptor::new("b", ColumnType::VarChar(10)).primary_key(),
            ],
            &[],
        )
        .unwrap();
        assert!(sql.ends_with("PRIMARY KEY (\"a\", \"b\"));"));
    }

    #[test]
    fn identity_with_extra_key_is_rejected() {
        let table = TableDescriptor::new(
            "cms_bad",
            vec![
                ColumnDescriptor::identity("id"),
                ColumnDescriptor::new("code", ColumnType::Text).primary_key(),
            ],
        );
        assert!(validate_table(&table).is_err());
    }

    #[test]
    fn quoted_names_reject_injection() {
        let table = TableDescriptor::new(
            "cms_x\"; DROP TABLE cms_site; --",
            vec![ColumnDescriptor::identity("id")],
        );
        assert!(validate_table(&table).is_err());
    }
}
