// crates/siteboot-core/src/core/time.rs
// ============================================================================
// Module: Siteboot Time Helpers
// Description: Wall-clock helpers for record stamps.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Config stamps and administrator records carry unix epoch milliseconds.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

/// Returns the current unix epoch in milliseconds.
#[must_use]
pub fn unix_millis() -> i64 {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
