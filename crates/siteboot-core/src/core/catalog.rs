// crates/siteboot-core/src/core/catalog.rs
// ============================================================================
// Module: Siteboot System Catalog
// Description: Built-in system table descriptors and the content table template.
// Purpose: Supply the target schema consumed by the schema reconciler.
// Dependencies: crate::core::schema
// ============================================================================

//! ## Overview
//! The catalog lists every system table the platform owns, in reconciliation
//! order, plus the column template shared by all per-site content tables.
//! The site table always comes first: content tables are enumerated from it,
//! so it must exist before content reconciliation runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::schema::ColumnDescriptor;
use crate::core::schema::ColumnType;
use crate::core::schema::TableDescriptor;

// ============================================================================
// SECTION: Table Names
// ============================================================================

/// Site table name.
pub const SITE_TABLE: &str = "cms_site";
/// Config table name.
pub const CONFIG_TABLE: &str = "cms_config";
/// Administrator table name.
pub const ADMINISTRATOR_TABLE: &str = "cms_administrator";
/// Administrator role membership table name.
pub const ADMINISTRATOR_ROLE_TABLE: &str = "cms_administrator_role";

/// Deprecated content columns removed when an existing content table is altered.
pub const CONTENT_DROP_COLUMNS: &[&str] = &[
    "writing_user_name",
    "check_task_date",
    "uncheck_task_date",
    "member_name",
    "settings_xml",
];

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Ordered set of system tables plus the shared content table template.
///
/// # Invariants
/// - The site table precedes any descriptor appended with [`SystemCatalog::with_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCatalog {
    /// System table descriptors in reconciliation order.
    tables: Vec<TableDescriptor>,
    /// Column template shared by every content table.
    content_columns: Vec<ColumnDescriptor>,
    /// Columns dropped from content tables during alteration.
    content_drop_columns: Vec<String>,
}

impl SystemCatalog {
    /// Returns the built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            tables: vec![
                site_table(),
                config_table(),
                administrator_table(),
                administrator_role_table(),
            ],
            content_columns: content_columns(),
            content_drop_columns: CONTENT_DROP_COLUMNS
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Creates a catalog from explicit parts.
    #[must_use]
    pub const fn from_parts(
        tables: Vec<TableDescriptor>,
        content_columns: Vec<ColumnDescriptor>,
        content_drop_columns: Vec<String>,
    ) -> Self {
        Self {
            tables,
            content_columns,
            content_drop_columns,
        }
    }

    /// Appends a system table owned by another module.
    #[must_use]
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.tables.push(table);
        self
    }

    /// Returns system tables in reconciliation order.
    #[must_use]
    pub fn tables(&self) -> &[TableDescriptor] {
        &self.tables
    }

    /// Builds the target descriptor for a content table.
    #[must_use]
    pub fn content_table(&self, table_name: &str) -> TableDescriptor {
        TableDescriptor::new(table_name, self.content_columns.clone())
    }

    /// Returns the deprecated content columns.
    #[must_use]
    pub fn content_drop_columns(&self) -> Vec<&str> {
        self.content_drop_columns.iter().map(String::as_str).collect()
    }
}

impl Default for SystemCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// ============================================================================
// SECTION: Built-in Tables
// ============================================================================

/// Site table descriptor.
#[must_use]
pub fn site_table() -> TableDescriptor {
    TableDescriptor::new(
        SITE_TABLE,
        vec![
            ColumnDescriptor::identity("id"),
            ColumnDescriptor::new("site_dir", ColumnType::VarChar(50)),
            ColumnDescriptor::new("site_name", ColumnType::VarChar(50)),
            ColumnDescriptor::new("table_name", ColumnType::VarChar(50)),
            ColumnDescriptor::new("is_root", ColumnType::Boolean),
            ColumnDescriptor::new("parent_id", ColumnType::Integer),
            ColumnDescriptor::new("taxis", ColumnType::Integer),
            ColumnDescriptor::new("domain_names", ColumnType::Text),
        ],
    )
}

/// Config table descriptor.
#[must_use]
pub fn config_table() -> TableDescriptor {
    TableDescriptor::new(
        CONFIG_TABLE,
        vec![
            ColumnDescriptor::identity("id"),
            ColumnDescriptor::new("is_initialized", ColumnType::Boolean),
            ColumnDescriptor::new("database_version", ColumnType::VarChar(50)),
            ColumnDescriptor::new("updated_at_ms", ColumnType::Integer),
            ColumnDescriptor::new("system_config", ColumnType::Text),
        ],
    )
}

/// Administrator table descriptor.
#[must_use]
pub fn administrator_table() -> TableDescriptor {
    TableDescriptor::new(
        ADMINISTRATOR_TABLE,
        vec![
            ColumnDescriptor::identity("id"),
            ColumnDescriptor::new("user_name", ColumnType::VarChar(255)),
            ColumnDescriptor::new("password", ColumnType::VarChar(255)),
            ColumnDescriptor::new("password_format", ColumnType::VarChar(50)),
            ColumnDescriptor::new("password_salt", ColumnType::VarChar(128)),
            ColumnDescriptor::new("created_at_ms", ColumnType::Integer),
            ColumnDescriptor::new("last_activity_ms", ColumnType::Integer),
            ColumnDescriptor::new("is_locked_out", ColumnType::Boolean),
            ColumnDescriptor::new("display_name", ColumnType::VarChar(255)),
            ColumnDescriptor::new("email", ColumnType::VarChar(255)),
        ],
    )
}

/// Administrator role membership table descriptor.
#[must_use]
pub fn administrator_role_table() -> TableDescriptor {
    TableDescriptor::new(
        ADMINISTRATOR_ROLE_TABLE,
        vec![
            ColumnDescriptor::identity("id"),
            ColumnDescriptor::new("role_name", ColumnType::VarChar(255)),
            ColumnDescriptor::new("user_name", ColumnType::VarChar(255)),
        ],
    )
}

/// Column template shared by every content table.
fn content_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::identity("id"),
        ColumnDescriptor::new("channel_id", ColumnType::Integer),
        ColumnDescriptor::new("site_id", ColumnType::Integer),
        ColumnDescriptor::new("add_user_name", ColumnType::VarChar(255)),
        ColumnDescriptor::new("last_edit_user_name", ColumnType::VarChar(255)),
        ColumnDescriptor::new("last_edit_date", ColumnType::DateTime),
        ColumnDescriptor::new("taxis", ColumnType::Integer),
        ColumnDescriptor::new("tags", ColumnType::VarChar(255)),
        ColumnDescriptor::new("is_checked", ColumnType::Boolean),
        ColumnDescriptor::new("check_level", ColumnType::Integer),
        ColumnDescriptor::new("hits", ColumnType::Integer),
        ColumnDescriptor::new("title", ColumnType::VarChar(255)),
        ColumnDescriptor::new("sub_title", ColumnType::VarChar(255)),
        ColumnDescriptor::new("image_url", ColumnType::VarChar(200)),
        ColumnDescriptor::new("link_url", ColumnType::VarChar(200)),
        ColumnDescriptor::new("summary", ColumnType::Text),
        ColumnDescriptor::new("body", ColumnType::Text),
        ColumnDescriptor::new("author", ColumnType::VarChar(255)),
        ColumnDescriptor::new("is_top", ColumnType::Boolean),
        ColumnDescriptor::new("is_recommend", ColumnType::Boolean),
        ColumnDescriptor::new("price", ColumnType::Decimal),
        ColumnDescriptor::new("add_date", ColumnType::DateTime),
    ]
}
