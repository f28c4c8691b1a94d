// crates/siteboot-core/src/runtime/reconciler.rs
// ============================================================================
// Module: Siteboot Schema Reconciler
// Description: Idempotent create-or-alter of tables against descriptors.
// Purpose: Bring system and content tables in line with the declared schema.
// Dependencies: crate::core, crate::events, crate::interfaces
// ============================================================================

//! ## Overview
//! The reconciler creates a missing table with exactly its declared columns,
//! or asks the store to alter an existing table until it matches. Running it
//! twice with the same descriptors is a no-op the second time.
//!
//! Failures are not caught: the first error aborts the remaining sequence and
//! tables reconciled before it stay changed. Re-running is the recovery path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::catalog::SystemCatalog;
use crate::core::schema::AlterPlan;
use crate::core::schema::TableDescriptor;
use crate::events::SiteEvent;
use crate::events::SiteEventKind;
use crate::events::SiteEventSink;
use crate::interfaces::SchemaStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of reconciling one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "plan", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The table did not exist and was created.
    Created,
    /// The table existed and was altered by the contained plan.
    Altered(AlterPlan),
    /// The table already matched its descriptor.
    Unchanged,
    /// The descriptor had no name or no columns.
    Skipped,
}

/// Outcome for a named table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// Table name (possibly empty for skipped descriptors).
    pub table_name: String,
    /// Reconciliation outcome.
    pub outcome: ReconcileOutcome,
}

// ============================================================================
// SECTION: Reconciler
// ============================================================================

/// Applies table descriptors through a [`SchemaStore`].
pub struct SchemaReconciler<'a, S: SchemaStore + ?Sized> {
    /// Backing schema store.
    store: &'a S,
    /// Event sink for per-table outcomes.
    events: &'a dyn SiteEventSink,
}

impl<'a, S: SchemaStore + ?Sized> SchemaReconciler<'a, S> {
    /// Creates a reconciler over `store`.
    #[must_use]
    pub const fn new(store: &'a S, events: &'a dyn SiteEventSink) -> Self {
        Self {
            store,
            events,
        }
    }

    /// Creates `table` when missing, otherwise alters it to match.
    ///
    /// `drop_columns` only applies when altering; a freshly created table has
    /// exactly the declared columns.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] from the store unchanged.
    pub fn reconcile_table(
        &self,
        table: &TableDescriptor,
        drop_columns: &[&str],
    ) -> Result<ReconcileOutcome, StoreError> {
        if !self.store.table_exists(&table.name)? {
            self.store.create_table(table)?;
            self.events.record(
                &SiteEvent::new(SiteEventKind::TableCreated)
                    .with_table(&table.name)
                    .with_count(table.columns.len()),
            );
            return Ok(ReconcileOutcome::Created);
        }
        let plan = self.store.alter_table(table, drop_columns)?;
        if plan.is_empty() {
            self.events.record(&SiteEvent::new(SiteEventKind::TableUnchanged).with_table(&table.name));
            return Ok(ReconcileOutcome::Unchanged);
        }
        self.events.record(
            &SiteEvent::new(SiteEventKind::TableAltered)
                .with_table(&table.name)
                .with_detail(plan.summary()),
        );
        Ok(ReconcileOutcome::Altered(plan))
    }

    /// Reconciles every system table in catalog order, skipping descriptors
    /// without a name or columns.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`]; later tables are not attempted.
    pub fn reconcile_system_tables(
        &self,
        catalog: &SystemCatalog,
    ) -> Result<Vec<TableReport>, StoreError> {
        let mut reports = Vec::with_capacity(catalog.tables().len());
        for table in catalog.tables() {
            if !table.is_reconcilable() {
                self.events.record(
                    &SiteEvent::new(SiteEventKind::TableSkipped)
                        .with_table(&table.name)
                        .with_count(table.columns.len()),
                );
                reports.push(TableReport {
                    table_name: table.name.clone(),
                    outcome: ReconcileOutcome::Skipped,
                });
                continue;
            }
            let outcome = self.reconcile_table(table, &[])?;
            reports.push(TableReport {
                table_name: table.name.clone(),
                outcome,
            });
        }
        Ok(reports)
    }

    /// Reconciles each named content table against the catalog's shared
    /// template, applying the deprecated-column drop list when altering.
    ///
    /// Table names are matched ignoring ASCII case; only the first spelling
    /// of a name is reconciled.
    ///
    /// # Errors
    ///
    /// Returns the first [`StoreError`]; later tables are not attempted.
    pub fn reconcile_content_tables(
        &self,
        table_names: &[String],
        catalog: &SystemCatalog,
    ) -> Result<Vec<TableReport>, StoreError> {
        let drop_columns = catalog.content_drop_columns();
        let mut reports: Vec<TableReport> = Vec::with_capacity(table_names.len());
        for table_name in table_names {
            if table_name.trim().is_empty()
                || reports.iter().any(|done| done.table_name.eq_ignore_ascii_case(table_name))
            {
                continue;
            }
            let table = catalog.content_table(table_name);
            let outcome = self.reconcile_table(&table, &drop_columns)?;
            reports.push(TableReport {
                table_name: table_name.clone(),
                outcome,
            });
        }
        Ok(reports)
    }
}
