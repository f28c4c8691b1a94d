// crates/siteboot-core/src/core/mod.rs
// ============================================================================
// Module: Siteboot Core Model
// Description: Data model shared by reconciliation, installation and routing.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Site descriptors, the installation record, administrator accounts, schema
//! descriptors and the built-in system catalog.

pub mod administrator;
pub mod catalog;
pub mod config_record;
pub mod schema;
pub mod site;
pub mod time;
pub mod version;

pub use administrator::*;
pub use catalog::SystemCatalog;
pub use config_record::ConfigRecord;
pub use schema::*;
pub use site::*;
pub use version::*;
