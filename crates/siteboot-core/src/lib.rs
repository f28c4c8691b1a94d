// crates/siteboot-core/src/lib.rs
// ============================================================================
// Module: Siteboot Core Library
// Description: Installation state, site registry and schema sync engine.
// Purpose: Answer "is the system installed" and "which site owns this host",
//          and keep storage in line with the declared schema.
// Dependencies: crate::{core, events, interfaces, runtime}
// ============================================================================

//! ## Overview
//! `siteboot-core` is backend-agnostic. Persistence is consumed through the
//! traits in [`interfaces`]; [`SiteSystem`] ties a backend to the installation
//! flag, the site registry and the installer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod events;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;
pub use events::FileEventSink;
pub use events::NoopEventSink;
pub use events::SiteEvent;
pub use events::SiteEventKind;
pub use events::SiteEventSink;
pub use events::StderrEventSink;
pub use interfaces::*;
pub use runtime::*;
