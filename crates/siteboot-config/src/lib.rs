// crates/siteboot-config/src/lib.rs
// ============================================================================
// Module: Siteboot Config Library
// Description: Config model and validation for siteboot.toml.
// Purpose: Single source of truth for siteboot.toml semantics.
// Dependencies: siteboot-core, siteboot-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `siteboot-config` loads `siteboot.toml`, applies defaults and fails closed
//! on anything it cannot validate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
