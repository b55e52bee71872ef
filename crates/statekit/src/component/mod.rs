//! statekit::component
//!
//! Lifecycle components: state storage, signal emission and the async transition
//! protocol. Semantics (what is allowed, where a transition lands) come from
//! `statekit_core::lifecycle`; this module owns locking, handler invocation and
//! emission order.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use statekit_core::error::{CoreError, Domain, Result};
use statekit_core::lifecycle::{
    available_operations, Event, EventPayload, Layer, Layers, Operation, Signal, SignalSet, State,
    StateSet,
};

use crate::logging::Logger;
use crate::notifier::{Callback, Notifier, SubscriptionId};

mod handlers;
mod transition;

pub use handlers::{succeed, HandlerFuture, Handlers, NoopHandlers};

/// Read-only view of a component, as consumed by watchers and waiters.
pub trait Observable: Send + Sync {
    fn name(&self) -> &str;

    fn state(&self) -> State;

    fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    fn subscribe(&self, filter: Option<Signal>, callback: Callback) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// A stateful component composing one or more capability layers.
///
/// Built with [`Component::builder`]. Normally shared as `Arc<Component>`.
pub struct Component {
    name: String,
    layers: Layers,
    states: StateSet,
    signals: SignalSet,
    state: Mutex<State>,
    initialized: AtomicBool,
    ready_on_initialize: bool,
    notifier: Notifier,
    handlers: Box<dyn Handlers>,
    logger: Logger,
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("layers", &self.layers)
            .field("state", &self.state())
            .field("suppressed", &self.is_suppressed())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Component`].
pub struct ComponentBuilder {
    name: String,
    layers: Layers,
    handlers: Option<Box<dyn Handlers>>,
    logger: Option<Logger>,
    ready_on_initialize: bool,
}

impl ComponentBuilder {
    /// Compose a capability layer (its ancestors come along).
    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers = self.layers.with(layer);
        self
    }

    pub fn handlers(mut self, handlers: impl Handlers) -> Self {
        self.handlers = Some(Box::new(handlers));
        self
    }

    /// Inject a logger; otherwise one named after the component is resolved
    /// from the default registry.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Move straight on to `Ready` after a successful initialize.
    pub fn ready_on_initialize(mut self, enabled: bool) -> Self {
        self.ready_on_initialize = enabled;
        self
    }

    pub fn build(self) -> Result<Component> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::invalid_argument(
                Domain::Lifecycle,
                "component name must not be empty",
            ));
        }

        Ok(self.assemble(name))
    }

    /// Build with an already validated name.
    pub(crate) fn assemble(self, name: String) -> Component {
        let logger = self.logger.unwrap_or_else(|| Logger::named(&name));
        let layers = self.layers;

        Component {
            states: layers.states(),
            signals: layers.signals(),
            state: Mutex::new(layers.initial_state()),
            initialized: AtomicBool::new(false),
            ready_on_initialize: self.ready_on_initialize,
            notifier: Notifier::new(),
            handlers: self.handlers.unwrap_or_else(|| Box::new(NoopHandlers)),
            logger,
            layers,
            name,
        }
    }
}

impl Component {
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            name: name.into(),
            layers: Layers::new(),
            handlers: None,
            logger: None,
            ready_on_initialize: false,
        }
    }

    /// Plain stateful component (base layer only).
    pub fn stateful(name: impl Into<String>) -> Result<Self> {
        Self::builder(name).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> Layers {
        self.layers
    }

    pub fn supports(&self, layer: Layer) -> bool {
        self.layers.contains(layer)
    }

    pub fn valid_states(&self) -> StateSet {
        self.states
    }

    pub fn valid_signals(&self) -> SignalSet {
        self.signals
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn state(&self) -> State {
        *self.state.lock()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    /// True between a successful initialize and a successful finalize.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Operations whose guard currently holds.
    pub fn available_operations(&self) -> Vec<Operation> {
        available_operations(self.layers, self.state())
            .into_iter()
            .filter(|op| {
                !matches!(op, Operation::Pause | Operation::Resume) || self.handlers.can_pause()
            })
            .collect()
    }

    /// Set the current state.
    ///
    /// Equal or foreign states are ignored. On change emits `stateChanged` and,
    /// when entering `Ready`, `ready`.
    pub fn set_state(&self, state: State) {
        if let Some(previous) = self.write_state(state) {
            self.announce_state(state, previous, true);
        }
    }

    /// Store `state` if it is valid and different. Returns the previous state on change.
    fn write_state(&self, state: State) -> Option<State> {
        if !self.states.contains(state) {
            self.logger
                .debug(format_args!("ignoring state {state}: not valid for this component"));
            return None;
        }
        let mut current = self.state.lock();
        if *current == state {
            return None;
        }
        let previous = std::mem::replace(&mut *current, state);
        Some(previous)
    }

    fn announce_state(&self, current: State, previous: State, ready: bool) {
        self.logger
            .trace(format_args!("state {previous} -> {current}"));
        self.emit(Event::state_changed(current, previous));
        if ready && current == State::Ready {
            self.emit(Event::bare(Signal::Ready));
        }
    }

    /// Fan `event` out to subscribers unless emission is suppressed.
    ///
    /// Signals the component does not compose are dropped.
    pub fn emit(&self, event: Event) {
        if !self.signals.contains(event.signal) {
            self.logger.debug(format_args!(
                "dropping signal {}: not valid for this component",
                event.signal
            ));
            return;
        }
        self.notifier.emit(&event);
    }

    pub fn is_suppressed(&self) -> bool {
        self.notifier.is_suppressed()
    }

    /// Mute or unmute emission.
    ///
    /// The change itself is always announced (`suppressionChanged`, then
    /// `flagChanged("suppressed", ..)`), even when muting.
    pub fn set_suppressed(&self, suppressed: bool) {
        let previous = self.notifier.set_suppressed(suppressed);
        if previous == suppressed {
            return;
        }
        let payload = EventPayload::Flag {
            name: "suppressed",
            current: suppressed,
            previous,
        };
        self.notifier
            .force_emit(&Event::new(Signal::SuppressionChanged, payload.clone()));
        self.notifier
            .force_emit(&Event::new(Signal::FlagChanged, payload));
    }

    /// Subscribe to one signal (`Some`) or all signals (`None`).
    pub fn subscribe(&self, filter: Option<Signal>, callback: Callback) -> SubscriptionId {
        self.notifier.subscribe(filter, callback)
    }

    /// Closure-friendly form of [`Component::subscribe`] for a single signal.
    pub fn on<F>(&self, signal: Signal, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.notifier.subscribe(Some(signal), Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.notifier.subscriber_count()
    }
}

impl Observable for Component {
    fn name(&self) -> &str {
        Component::name(self)
    }

    fn state(&self) -> State {
        Component::state(self)
    }

    fn subscribe(&self, filter: Option<Signal>, callback: Callback) -> SubscriptionId {
        Component::subscribe(self, filter, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        Component::unsubscribe(self, id)
    }
}
