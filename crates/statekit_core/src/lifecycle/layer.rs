use super::{Signal, SignalSet, State, StateSet};

/// A capability layer. Each layer contributes a fragment of states and signals;
/// a component's valid sets are the union over every layer it composes,
/// ancestors included.
///
/// ```text
/// Base
///  └─ Lifecycle
///      ├─ Connectable
///      ├─ Loadable
///      └─ Runnable
///          └─ Watcher
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Layer {
    Base,
    Lifecycle,
    Connectable,
    Loadable,
    Runnable,
    Watcher,
}

impl Layer {
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Layer::Base => "base",
            Layer::Lifecycle => "lifecycle",
            Layer::Connectable => "connectable",
            Layer::Loadable => "loadable",
            Layer::Runnable => "runnable",
            Layer::Watcher => "watcher",
        }
    }

    pub const fn parent(self) -> Option<Layer> {
        match self {
            Layer::Base => None,
            Layer::Lifecycle => Some(Layer::Base),
            Layer::Connectable | Layer::Loadable | Layer::Runnable => Some(Layer::Lifecycle),
            Layer::Watcher => Some(Layer::Runnable),
        }
    }

    /// States this layer adds on top of its parent.
    pub const fn states(self) -> &'static [State] {
        match self {
            Layer::Base => &[State::None, State::Ready],
            Layer::Lifecycle => &[
                State::NotInitialized,
                State::Initializing,
                State::Initialized,
                State::Finalizing,
            ],
            Layer::Connectable => &[State::Connecting, State::Disconnecting],
            Layer::Loadable => &[State::Loading, State::Unloading],
            Layer::Runnable => &[
                State::Starting,
                State::Running,
                State::Pausing,
                State::Paused,
                State::Resuming,
                State::Stopping,
                State::Finishing,
            ],
            Layer::Watcher => &[],
        }
    }

    /// Signals this layer adds on top of its parent.
    pub const fn signals(self) -> &'static [Signal] {
        match self {
            Layer::Base => &[
                Signal::Ready,
                Signal::StateChanged,
                Signal::SuppressionChanged,
                Signal::FlagChanged,
            ],
            Layer::Lifecycle => &[
                Signal::Initializing,
                Signal::InitializationSucceeded,
                Signal::InitializationFailed,
                Signal::Finalizing,
                Signal::FinalizationSucceeded,
                Signal::FinalizationFailed,
            ],
            Layer::Connectable => &[
                Signal::Connecting,
                Signal::Connected,
                Signal::ConnectionFailed,
                Signal::ConnectionLost,
                Signal::Reconnected,
                Signal::Disconnecting,
                Signal::Disconnected,
                Signal::DisconnectionFailed,
            ],
            Layer::Loadable => &[
                Signal::Loading,
                Signal::Loaded,
                Signal::LoadFailed,
                Signal::Unloading,
                Signal::Unloaded,
                Signal::UnloadFailed,
            ],
            Layer::Runnable => &[
                Signal::Starting,
                Signal::Started,
                Signal::StartFailed,
                Signal::Pausing,
                Signal::Paused,
                Signal::PauseFailed,
                Signal::Resuming,
                Signal::Resumed,
                Signal::ResumeFailed,
                Signal::Stopping,
                Signal::Stopped,
                Signal::StopFailed,
                Signal::Finished,
                Signal::FinishedWithError,
            ],
            Layer::Watcher => &[Signal::Synchronized, Signal::Desynchronized],
        }
    }
}

/// Canonical list of all layers, ordered by id.
pub const ALL_LAYERS: [Layer; 6] = [
    Layer::Base,
    Layer::Lifecycle,
    Layer::Connectable,
    Layer::Loadable,
    Layer::Runnable,
    Layer::Watcher,
];

/// The set of layers a component composes. Always closed over parents:
/// adding `Connectable` also adds `Lifecycle` and `Base`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Layers(u8);

impl Layers {
    /// Only the base layer (a plain stateful component).
    pub const BASE: Layers = Layers(1 << Layer::Base as u8);

    pub const fn new() -> Self {
        Self::BASE
    }

    /// Add a layer and all of its ancestors.
    pub const fn with(self, layer: Layer) -> Self {
        let mut bits = self.0;
        let mut current = Some(layer);
        while let Some(l) = current {
            bits |= 1 << l.id();
            current = l.parent();
        }
        Layers(bits)
    }

    pub const fn contains(self, layer: Layer) -> bool {
        self.0 & (1 << layer.id()) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Layer> {
        ALL_LAYERS.into_iter().filter(move |l| self.contains(*l))
    }

    /// Union of the state fragments of every composed layer.
    pub fn states(self) -> StateSet {
        self.iter()
            .flat_map(|l| l.states().iter().copied())
            .collect()
    }

    /// Union of the signal fragments of every composed layer.
    pub fn signals(self) -> SignalSet {
        self.iter()
            .flat_map(|l| l.signals().iter().copied())
            .collect()
    }

    /// State a freshly built component starts in.
    pub const fn initial_state(self) -> State {
        if self.contains(Layer::Lifecycle) {
            State::NotInitialized
        } else {
            State::None
        }
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Layer> for Layers {
    fn from_iter<I: IntoIterator<Item = Layer>>(iter: I) -> Self {
        iter.into_iter().fold(Layers::BASE, Layers::with)
    }
}
