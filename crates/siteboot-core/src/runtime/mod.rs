// crates/siteboot-core/src/runtime/mod.rs
// ============================================================================
// Module: Siteboot Runtime
// Description: Reconciliation, installation state, site registry and installer.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime components that act on the persistence contracts.

pub mod install_state;
pub mod installer;
pub mod reconciler;
pub mod registry;
pub mod system;

pub use install_state::InstallationState;
pub use installer::InstallError;
pub use installer::InstallReport;
pub use installer::Installer;
pub use installer::SyncReport;
pub use reconciler::ReconcileOutcome;
pub use reconciler::SchemaReconciler;
pub use reconciler::TableReport;
pub use registry::DomainCollision;
pub use registry::SiteRegistry;
pub use registry::SiteSnapshot;
pub use system::SiteSystem;
