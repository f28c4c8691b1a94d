// crates/siteboot-core/src/core/schema.rs
// ============================================================================
// Module: Siteboot Schema Model
// Description: Declarative table and column descriptors plus alteration planning.
// Purpose: Describe the target storage schema and diff it against live tables.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Data-owning modules describe their tables as [`TableDescriptor`] values. The
//! reconciler hands those descriptors to the persistence backend, which uses
//! [`plan_alteration`] to compute the minimal set of changes that brings an
//! existing table in line with the descriptor. Planning is pure so every
//! backend diffs columns the same way.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a table or column identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

// ============================================================================
// SECTION: Column Types
// ============================================================================

/// Logical column data type.
///
/// # Invariants
/// - [`ColumnType::declared_type`] is stable; changing it retypes live columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "length", rename_all = "snake_case")]
pub enum ColumnType {
    /// Signed 64-bit integer.
    Integer,
    /// Boolean stored as 0/1.
    Boolean,
    /// Bounded character data.
    VarChar(u32),
    /// Unbounded character data.
    Text,
    /// Date and time value.
    DateTime,
    /// Fixed-point decimal value.
    Decimal,
}

impl ColumnType {
    /// Returns the declared SQL type used when creating the column.
    #[must_use]
    pub fn declared_type(self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::VarChar(length) => format!("VARCHAR({length})"),
            Self::Text => "TEXT".to_string(),
            Self::DateTime => "DATETIME".to_string(),
            Self::Decimal => "DECIMAL(18,2)".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Target definition of a single column.
///
/// # Invariants
/// - `is_identity` implies `is_primary_key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Logical data type.
    pub data_type: ColumnType,
    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,
    /// Whether the column is an auto-incrementing identity.
    pub is_identity: bool,
}

impl ColumnDescriptor {
    /// Creates a plain nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            is_primary_key: false,
            is_identity: false,
        }
    }

    /// Creates an auto-incrementing integer primary key column.
    #[must_use]
    pub fn identity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: ColumnType::Integer,
            is_primary_key: true,
            is_identity: true,
        }
    }

    /// Marks the column as part of the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }
}

/// Target definition of a table: a name plus an ordered column set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Ordered column definitions.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Creates a table descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Returns true when the descriptor names a table and has at least one column.
    #[must_use]
    pub fn is_reconcilable(&self) -> bool {
        !self.name.trim().is_empty() && !self.columns.is_empty()
    }

    /// Looks up a column by name, ignoring ASCII case.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|column| column.name.eq_ignore_ascii_case(name))
    }
}

/// Column as reported by a live table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingColumn {
    /// Column name as stored.
    pub name: String,
    /// Declared SQL type as stored.
    pub declared_type: String,
    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,
}

// ============================================================================
// SECTION: Alteration Planning
// ============================================================================

/// Changes required to bring a live table in line with its descriptor.
///
/// # Invariants
/// - Key columns appear in `retype` only when their primary-key status
///   differs from the target.
/// - Primary-key columns never appear in `drop`.
/// - `drop` only names columns that exist and are absent from the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterPlan {
    /// Columns missing from the live table.
    pub add: Vec<ColumnDescriptor>,
    /// Columns whose declared type or primary-key status differs from the
    /// target.
    pub retype: Vec<ColumnDescriptor>,
    /// Live column names scheduled for removal.
    pub drop: Vec<String>,
}

impl AlterPlan {
    /// Returns true when the table already matches its descriptor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.retype.is_empty() && self.drop.is_empty()
    }

    /// Returns true when the plan cannot be applied with in-place column edits.
    #[must_use]
    pub fn requires_rebuild(&self) -> bool {
        !self.retype.is_empty() || self.add.iter().any(|column| column.is_primary_key)
    }

    /// Returns a compact human-readable summary for event logs.
    #[must_use]
    pub fn summary(&self) -> String {
        let names = |columns: &[ColumnDescriptor]| {
            columns.iter().map(|column| column.name.as_str()).collect::<Vec<_>>().join(",")
        };
        format!(
            "add=[{}] retype=[{}] drop=[{}]",
            names(&self.add),
            names(&self.retype),
            self.drop.join(",")
        )
    }
}

/// Computes the alteration plan for a live table.
///
/// Column names compare case-insensitively and declared types compare after
/// [`normalize_declared_type`]. Key columns are only compared by key status,
/// so a legacy `id` without a key is retyped into the identity key. Entries
/// of `drop_columns` that are still part of the target, or are primary keys,
/// are ignored.
#[must_use]
pub fn plan_alteration(
    existing: &[ExistingColumn],
    target: &TableDescriptor,
    drop_columns: &[&str],
) -> AlterPlan {
    let find = |name: &str| existing.iter().find(|column| column.name.eq_ignore_ascii_case(name));
    let mut plan = AlterPlan::default();
    for column in &target.columns {
        match find(&column.name) {
            None => plan.add.push(column.clone()),
            Some(live) => {
                if column.is_primary_key != live.is_primary_key {
                    plan.retype.push(column.clone());
                    continue;
                }
                if column.is_primary_key {
                    continue;
                }
                if normalize_declared_type(&live.declared_type)
                    != normalize_declared_type(&column.data_type.declared_type())
                {
                    plan.retype.push(column.clone());
                }
            }
        }
    }
    for name in drop_columns {
        if target.column(name).is_some() {
            continue;
        }
        if let Some(live) = find(name)
            && !live.is_primary_key
            && !plan.drop.iter().any(|dropped| dropped.eq_ignore_ascii_case(&live.name))
        {
            plan.drop.push(live.name.clone());
        }
    }
    plan
}

/// Normalizes a declared SQL type for comparison.
#[must_use]
pub fn normalize_declared_type(declared: &str) -> String {
    declared.chars().filter(|ch| !ch.is_whitespace()).collect::<String>().to_ascii_uppercase()
}

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Identifier validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Identifier is empty.
    #[error("identifier must be non-empty")]
    Empty,
    /// Identifier exceeds [`MAX_IDENTIFIER_LENGTH`].
    #[error("identifier exceeds max length: {0}")]
    TooLong(String),
    /// Identifier contains characters outside `[A-Za-z0-9_]` or starts with a digit.
    #[error("identifier contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Validates a table or column identifier before it is spliced into SQL.
///
/// # Errors
///
/// Returns [`IdentifierError`] when the identifier is empty, too long, or
/// contains characters other than ASCII letters, digits and underscores.
pub fn validate_identifier(name: &str) -> Result<(), IdentifierError> {
    let Some(first) = name.chars().next() else {
        return Err(IdentifierError::Empty);
    };
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(IdentifierError::TooLong(name.to_string()));
    }
    if first.is_ascii_digit() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(IdentifierError::InvalidCharacters(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
