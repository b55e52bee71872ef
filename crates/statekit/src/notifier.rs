use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use statekit_core::lifecycle::{Event, Signal, SignalGate};

/// Subscriber callback. Runs synchronously on the emitting task.
pub type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscriber {
    id: SubscriptionId,
    filter: Option<Signal>,
    callback: Callback,
}

/// Synchronous fan-out of events to subscribers.
///
/// The subscriber list is snapshotted before dispatch and no lock is held while
/// callbacks run, so a callback may subscribe, unsubscribe or emit again.
pub struct Notifier {
    gate: SignalGate,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("suppressed", &self.gate.is_suppressed())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            gate: SignalGate::new(),
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Register `callback` for one signal (`Some`) or for every signal (`None`).
    pub fn subscribe(&self, filter: Option<Signal>, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push(Subscriber {
            id,
            filter,
            callback,
        });
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Dispatch `event` unless emission is suppressed.
    pub fn emit(&self, event: &Event) {
        if self.gate.is_suppressed() {
            return;
        }
        self.force_emit(event);
    }

    /// Dispatch `event` regardless of the suppression flag.
    pub fn force_emit(&self, event: &Event) {
        let targets: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .filter(|s| s.filter.map_or(true, |f| f == event.signal))
            .map(|s| Arc::clone(&s.callback))
            .collect();

        for callback in targets {
            callback(event);
        }
    }

    /// Store the flag and return its previous value.
    pub fn set_suppressed(&self, suppressed: bool) -> bool {
        self.gate.set(suppressed)
    }

    pub fn is_suppressed(&self) -> bool {
        self.gate.is_suppressed()
    }
}
