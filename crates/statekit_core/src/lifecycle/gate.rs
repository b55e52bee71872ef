use std::sync::atomic::{AtomicBool, Ordering};

/// Mute switch for signal emission.
///
/// Intended use (notifier layer):
/// - `suppress()` / `release()` toggle the flag
/// - dispatch checks `is_suppressed()` before fanning out
#[derive(Debug)]
pub struct SignalGate {
    suppressed: AtomicBool,
}

impl SignalGate {
    pub const fn new() -> Self {
        Self {
            suppressed: AtomicBool::new(false),
        }
    }

    pub fn suppress(&self) -> bool {
        self.set(true)
    }

    pub fn release(&self) -> bool {
        self.set(false)
    }

    /// Store the flag and return its previous value.
    pub fn set(&self, suppressed: bool) -> bool {
        self.suppressed.swap(suppressed, Ordering::AcqRel)
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::Acquire)
    }
}

impl Default for SignalGate {
    fn default() -> Self {
        Self::new()
    }
}
