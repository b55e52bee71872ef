//! statekit_core: runtime-agnostic core of the statekit lifecycle framework.
//!
//! Design goals:
//! - Pure, testable logic (no async runtime, no locking).
//! - Explicit types; no macro wizardry.
//! - Small, stable public API surface.

pub mod error;

/// Layered state/signal sets + operation table + transition engine.
pub mod lifecycle;
