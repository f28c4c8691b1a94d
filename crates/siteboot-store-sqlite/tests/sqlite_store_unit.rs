// crates/siteboot-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Targeted tests for the SQLite site store.
// Purpose: Validate path safety, create/alter behavior, site and config rows,
//          and administrator writes.
// ============================================================================

//! ## Overview
//! Unit-level tests for [`SqliteSiteStore`]:
//! - Path safety checks (empty, directory, overlong)
//! - Table creation, in-place alteration and rebuilds preserving data
//! - Site enumeration and distinct content table names
//! - Config insert/update and administrator conflict handling

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
    reason = "Test-only assertions and helpers are permitted."
)]

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;
use rusqlite::params;
use siteboot_core::AdministratorRecord;
use siteboot_core::AdministratorStore;
use siteboot_core::CacheControl;
use siteboot_core::ColumnDescriptor;
use siteboot_core::ColumnType;
use siteboot_core::ConfigRecord;
use siteboot_core::ConfigStore;
use siteboot_core::NoopEventSink;
use siteboot_core::ReconcileOutcome;
use siteboot_core::SchemaStore;
use siteboot_core::SiteDescriptor;
use siteboot_core::SiteStore;
use siteboot_core::SiteSystem;
use siteboot_core::StoreError;
use siteboot_core::SystemCatalog;
use siteboot_core::TableDescriptor;
use siteboot_core::VersionInfo;
use siteboot_core::catalog::CONFIG_TABLE;
use siteboot_core::catalog::SITE_TABLE;
use siteboot_store_sqlite::SqliteSiteStore;
use siteboot_store_sqlite::SqliteStoreConfig;
use siteboot_store_sqlite::SqliteStoreError;
use siteboot_store_sqlite::SqliteStoreMode;
use siteboot_store_sqlite::SqliteSyncMode;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn open_store(temp: &TempDir) -> SqliteSiteStore {
    SqliteSiteStore::new(SqliteStoreConfig::for_path(temp.path().join("site.sqlite"))).unwrap()
}

fn create_system_tables(store: &SqliteSiteStore) {
    for table in SystemCatalog::builtin().tables() {
        store.create_table(table).unwrap();
    }
}

fn column_names(store: &SqliteSiteStore, table: &str) -> Vec<String> {
    store.table_columns(table).unwrap().into_iter().map(|column| column.name).collect()
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let temp = TempDir::new().unwrap();
    let Err(err) = SqliteSiteStore::new(SqliteStoreConfig::for_path(temp.path())) else {
        panic!("expected directory path to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_empty_path() {
    let Err(err) = SqliteSiteStore::new(SqliteStoreConfig::for_path(PathBuf::new())) else {
        panic!("expected empty path to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("a".repeat(300));
    let Err(err) = SqliteSiteStore::new(SqliteStoreConfig::for_path(path)) else {
        panic!("expected overlong component to fail");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn sqlite_store_rejects_zero_busy_timeout() {
    let temp = TempDir::new().unwrap();
    let config = SqliteStoreConfig {
        path: temp.path().join("site.sqlite"),
        busy_timeout_ms: 0,
        journal_mode: SqliteStoreMode::Delete,
        sync_mode: SqliteSyncMode::Normal,
    };
    assert!(matches!(SqliteSiteStore::new(config), Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_creates_missing_parent_directories() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("deeper").join("site.sqlite");
    let store = SqliteSiteStore::new(SqliteStoreConfig::for_path(&path)).unwrap();
    assert!(!store.table_exists(SITE_TABLE).unwrap());
    assert!(path.exists());
}

// ============================================================================
// SECTION: Schema
// ============================================================================

#[test]
fn created_table_matches_descriptor_and_second_alter_is_empty() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let catalog = SystemCatalog::builtin();
    let site = &catalog.tables()[0];

    store.create_table(site).unwrap();

    let expected: Vec<String> = site.columns.iter().map(|column| column.name.clone()).collect();
    assert_eq!(column_names(&store, SITE_TABLE), expected);
    let plan = store.alter_table(site, &[]).unwrap();
    assert!(plan.is_empty(), "unexpected plan: {plan:?}");
}

#[test]
fn alter_adds_and_drops_columns_in_place() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let path = temp.path().join("site.sqlite");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE cms_content (id INTEGER PRIMARY KEY AUTOINCREMENT, title VARCHAR(255), \
             settings_xml TEXT, custom_note TEXT);
             INSERT INTO cms_content (title, settings_xml, custom_note) VALUES ('hello', '<x/>', 'n');",
        )
        .unwrap();
    }
    let catalog = SystemCatalog::builtin();
    let target = catalog.content_table("cms_content");

    let plan = store.alter_table(&target, &catalog.content_drop_columns()).unwrap();

    assert_eq!(plan.drop, vec!["settings_xml".to_string()]);
    assert!(!plan.requires_rebuild());
    let live = column_names(&store, "cms_content");
    assert!(!live.contains(&"settings_xml".to_string()));
    assert!(live.contains(&"custom_note".to_string()));
    assert!(live.contains(&"channel_id".to_string()));
    let conn = Connection::open(&path).unwrap();
    let title: String =
        conn.query_row("SELECT title FROM cms_content WHERE id = 1", [], |row| row.get(0)).unwrap();
    assert_eq!(title, "hello");
}

#[test]
fn retype_rebuilds_table_and_keeps_rows() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let narrow = TableDescriptor::new(
        "cms_notes",
        vec![ColumnDescriptor::identity("id"), ColumnDescriptor::new("body", ColumnType::VarChar(20))],
    );
    store.create_table(&narrow).unwrap();
    {
        let conn = Connection::open(temp.path().join("site.sqlite")).unwrap();
        conn.execute("INSERT INTO cms_notes (body) VALUES (?1)", params!["kept"]).unwrap();
        conn.execute_batch("ALTER TABLE cms_notes ADD COLUMN extra TEXT;").unwrap();
    }
    store.clear_all_caches();
    let wide = TableDescriptor::new(
        "cms_notes",
        vec![ColumnDescriptor::identity("id"), ColumnDescriptor::new("body", ColumnType::Text)],
    );

    let plan = store.alter_table(&wide, &[]).unwrap();

    assert_eq!(plan.retype.len(), 1);
    let columns = store.table_columns("cms_notes").unwrap();
    let body = columns.iter().find(|column| column.name == "body").unwrap();
    assert_eq!(body.declared_type, "TEXT");
    assert!(columns.iter().any(|column| column.name == "extra"));
    let conn = Connection::open(temp.path().join("site.sqlite")).unwrap();
    let value: String = conn.query_row("SELECT body FROM cms_notes", [], |row| row.get(0)).unwrap();
    assert_eq!(value, "kept");
    assert!(store.alter_table(&wide, &[]).unwrap().is_empty());
}

#[test]
fn legacy_id_without_key_becomes_identity_key() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    Connection::open(temp.path().join("site.sqlite"))
        .unwrap()
        .execute_batch(
            "CREATE TABLE cms_notes (id INTEGER, body TEXT);
             INSERT INTO cms_notes (id, body) VALUES (7, 'kept');",
        )
        .unwrap();
    let table = TableDescriptor::new(
        "cms_notes",
        vec![ColumnDescriptor::identity("id"), ColumnDescriptor::new("body", ColumnType::Text)],
    );

    let plan = store.alter_table(&table, &[]).unwrap();

    assert!(plan.requires_rebuild());
    let columns = store.table_columns("cms_notes").unwrap();
    assert!(columns.iter().any(|column| column.name == "id" && column.is_primary_key));
    let conn = Connection::open(temp.path().join("site.sqlite")).unwrap();
    let body: String =
        conn.query_row("SELECT body FROM cms_notes WHERE id = 7", [], |row| row.get(0)).unwrap();
    assert_eq!(body, "kept");
    conn.execute("INSERT INTO cms_notes (body) VALUES ('next')", []).unwrap();
    let next: i64 = conn.query_row("SELECT MAX(id) FROM cms_notes", [], |row| row.get(0)).unwrap();
    assert_eq!(next, 8);
    assert!(store.alter_table(&table, &[]).unwrap().is_empty());
}

#[test]
fn alter_of_missing_table_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let table = TableDescriptor::new("cms_absent", vec![ColumnDescriptor::identity("id")]);

    let err = store.alter_table(&table, &[]).unwrap_err();

    assert_eq!(err, StoreError::NotFound("cms_absent".to_string()));
}

#[test]
fn invalid_identifiers_are_rejected_before_sql() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    let table = TableDescriptor::new(
        "cms_ok",
        vec![ColumnDescriptor::identity("id"), ColumnDescriptor::new("bad name", ColumnType::Text)],
    );

    let err = store.create_table(&table).unwrap_err();

    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(!store.table_exists("cms_ok").unwrap());
}

// ============================================================================
// SECTION: Sites
// ============================================================================

#[test]
fn site_reads_are_empty_before_site_table_exists() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);

    assert!(store.all_sites().unwrap().is_empty());
    assert!(store.all_content_table_names().unwrap().is_empty());
    assert!(matches!(
        store.insert_site(&SiteDescriptor::new(0, "main")),
        Err(SqliteStoreError::NotFound(_))
    ));
}

#[test]
fn sites_round_trip_in_insertion_order_with_distinct_tables() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    create_system_tables(&store);
    store.insert_site(&SiteDescriptor::new(0, "main").as_root()).unwrap();
    store
        .insert_site(
            &SiteDescriptor::new(0, "shop")
                .with_domains("shop.example.com")
                .with_table("cms_content_shop"),
        )
        .unwrap();
    store.insert_site(&SiteDescriptor::new(0, "blog").with_table("cms_content_shop")).unwrap();

    let sites = store.all_sites().unwrap();

    let dirs: Vec<&str> = sites.iter().map(|site| site.site_dir.as_str()).collect();
    assert_eq!(dirs, vec!["main", "shop", "blog"]);
    assert!(sites[0].is_root);
    assert_eq!(sites[1].domain_names, "shop.example.com");
    assert_eq!(
        store.all_content_table_names().unwrap(),
        vec!["cms_content".to_string(), "cms_content_shop".to_string()]
    );
}

#[test]
fn table_lookup_ignores_case() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    Connection::open(temp.path().join("site.sqlite"))
        .unwrap()
        .execute_batch("CREATE TABLE \"CMS_Notes\" (id INTEGER PRIMARY KEY AUTOINCREMENT);")
        .unwrap();

    assert!(store.table_exists("cms_notes").unwrap());
    assert!(store.table_exists("CMS_NOTES").unwrap());
}

#[test]
fn content_table_names_are_distinct_ignoring_case() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    create_system_tables(&store);
    store.insert_site(&SiteDescriptor::new(0, "a").with_table("cms_content_a")).unwrap();
    store.insert_site(&SiteDescriptor::new(0, "b").with_table("CMS_Content_A")).unwrap();

    let names = store.all_content_table_names().unwrap();

    assert_eq!(names.len(), 1);
    assert!(names[0].eq_ignore_ascii_case("cms_content_a"));
}

#[test]
fn sync_alters_legacy_site_table_stored_in_other_case() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("site.sqlite");
    Connection::open(&path)
        .unwrap()
        .execute_batch(
            "CREATE TABLE \"CMS_Site\" (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             site_dir VARCHAR(50), domain_names TEXT);
             INSERT INTO \"CMS_Site\" (site_dir, domain_names) VALUES ('main', 'example.com');",
        )
        .unwrap();
    let store = SqliteSiteStore::new(SqliteStoreConfig::for_path(&path)).unwrap();
    let system = SiteSystem::new(
        Arc::new(store),
        SystemCatalog::builtin(),
        VersionInfo::with_product_version("1.0.0"),
        Arc::new(NoopEventSink),
    );

    let first = system.sync_database().unwrap();
    assert!(matches!(first.system_tables[0].outcome, ReconcileOutcome::Altered(_)));
    system.refresh_site_registry().unwrap();
    assert_eq!(system.resolve_site_by_host("example.com").unwrap().site_dir, "main");

    let second = system.sync_database().unwrap();
    assert!(
        second
            .system_tables
            .iter()
            .chain(second.content_tables.iter())
            .all(|table| table.outcome == ReconcileOutcome::Unchanged)
    );
}

#[test]
fn sync_succeeds_with_site_tables_differing_only_in_case() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    create_system_tables(&store);
    store.insert_site(&SiteDescriptor::new(0, "a").with_table("cms_content_a")).unwrap();
    store.insert_site(&SiteDescriptor::new(0, "b").with_table("CMS_Content_A")).unwrap();
    let system = SiteSystem::new(
        Arc::new(store),
        SystemCatalog::builtin(),
        VersionInfo::with_product_version("1.0.0"),
        Arc::new(NoopEventSink),
    );

    let first = system.sync_database().unwrap();
    assert_eq!(first.content_tables.len(), 1);
    assert_eq!(first.content_tables[0].outcome, ReconcileOutcome::Created);

    let second = system.sync_database().unwrap();
    assert_eq!(second.content_tables[0].outcome, ReconcileOutcome::Unchanged);
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn config_record_is_absent_then_inserted_then_updated() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    assert!(store.config_record().unwrap().is_none());
    assert_eq!(store.database_version().unwrap(), "");
    create_system_tables(&store);

    store.insert_config_record(&ConfigRecord::initial("1.0.0", 10)).unwrap();
    let mut record = store.config_record().unwrap().unwrap();
    assert!(record.id > 0);
    assert!(store.is_initialized().unwrap());

    record.stamp("1.1.0", 20);
    store.update_config_record(&record).unwrap();

    let reloaded = store.config_record().unwrap().unwrap();
    assert_eq!(reloaded.database_version, "1.1.0");
    assert_eq!(reloaded.updated_at_ms, 20);
    assert_eq!(reloaded.id, record.id);
}

#[test]
fn update_of_unknown_config_row_is_not_found() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    create_system_tables(&store);
    let mut record = ConfigRecord::initial("1.0.0", 10);
    record.id = 99;

    let err = store.update_config_record(&record).unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
    assert!(store.config_record().unwrap().is_none());
    assert!(store.table_exists(CONFIG_TABLE).unwrap());
}

// ============================================================================
// SECTION: Administrators
// ============================================================================

#[test]
fn administrator_insert_conflicts_and_role_grant_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp);
    create_system_tables(&store);
    let record = AdministratorRecord::with_password("admin", "pw", 1);

    store.insert_administrator(&record).unwrap();
    let err = store.insert_administrator(&record).unwrap_err();
    store.add_user_to_role("admin", "ConsoleAdministrator").unwrap();
    store.add_user_to_role("admin", "ConsoleAdministrator").unwrap();

    assert_eq!(err, StoreError::Conflict("admin".to_string()));
    assert_eq!(store.roles_for_user("admin").unwrap(), vec!["ConsoleAdministrator".to_string()]);
    let loaded = store.administrator("admin").unwrap().unwrap();
    assert_eq!(loaded, record);
    assert!(loaded.verify_password("pw"));
}
