// crates/siteboot-core/src/runtime/install_state.rs
// ============================================================================
// Module: Siteboot Installation State
// Description: Process-wide, sticky "installed" flag.
// Purpose: Answer "has the system been installed" with at most one store read
//          per check until installation is confirmed.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The flag starts unconfirmed. Each check reads the persisted initialized
//! marker until it reports true; from then on the cached value answers
//! without I/O and never reverts, even if the persisted marker is cleared.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crate::interfaces::ConfigStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Installation State
// ============================================================================

/// Monotonic installation flag.
///
/// # Invariants
/// - Transitions only from `false` to `true`.
#[derive(Debug, Default)]
pub struct InstallationState {
    /// Cached installed flag.
    installed: AtomicBool,
}

impl InstallationState {
    /// Creates an unconfirmed state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
        }
    }

    /// Returns the cached flag without touching the store.
    #[must_use]
    pub fn cached(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Returns true once installation is confirmed, reading the persisted
    /// marker only while the cached flag is still false.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the persisted marker cannot be read.
    pub fn is_installed<C: ConfigStore + ?Sized>(&self, store: &C) -> Result<bool, StoreError> {
        if self.cached() {
            return Ok(true);
        }
        if store.is_initialized()? {
            self.mark_installed();
            return Ok(true);
        }
        Ok(false)
    }

    /// Sets the flag; returns true when this call performed the transition.
    pub fn mark_installed(&self) -> bool {
        !self.installed.swap(true, Ordering::AcqRel)
    }
}
