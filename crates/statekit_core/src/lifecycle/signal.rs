use std::fmt;

use crate::error::CoreError;

use super::State;

/// Named notifications a component can fan out to its subscribers.
///
/// Like states, signals are grouped per layer; a component may only emit the
/// signals of the layers it composes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Signal {
    // Base
    Ready,
    StateChanged,
    SuppressionChanged,
    FlagChanged,

    // Lifecycle
    Initializing,
    InitializationSucceeded,
    InitializationFailed,
    Finalizing,
    FinalizationSucceeded,
    FinalizationFailed,

    // Connectable
    Connecting,
    Connected,
    ConnectionFailed,
    ConnectionLost,
    Reconnected,
    Disconnecting,
    Disconnected,
    DisconnectionFailed,

    // Loadable
    Loading,
    Loaded,
    LoadFailed,
    Unloading,
    Unloaded,
    UnloadFailed,

    // Runnable
    Starting,
    Started,
    StartFailed,
    Pausing,
    Paused,
    PauseFailed,
    Resuming,
    Resumed,
    ResumeFailed,
    Stopping,
    Stopped,
    StopFailed,
    Finished,
    FinishedWithError,

    // Watcher
    Synchronized,
    Desynchronized,
}

impl Signal {
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Stable signal name, as seen by subscribers and in logs.
    pub const fn label(self) -> &'static str {
        match self {
            Signal::Ready => "ready",
            Signal::StateChanged => "stateChanged",
            Signal::SuppressionChanged => "suppressionChanged",
            Signal::FlagChanged => "flagChanged",
            Signal::Initializing => "initializing",
            Signal::InitializationSucceeded => "initializationSucceed",
            Signal::InitializationFailed => "initializationFailed",
            Signal::Finalizing => "finalizing",
            Signal::FinalizationSucceeded => "finalizationSucceed",
            Signal::FinalizationFailed => "finalizationFailed",
            Signal::Connecting => "connecting",
            Signal::Connected => "connected",
            Signal::ConnectionFailed => "connectionFailed",
            Signal::ConnectionLost => "connectionLost",
            Signal::Reconnected => "reconnected",
            Signal::Disconnecting => "disconnecting",
            Signal::Disconnected => "disconnected",
            Signal::DisconnectionFailed => "disconnectionFailed",
            Signal::Loading => "loading",
            Signal::Loaded => "loaded",
            Signal::LoadFailed => "loadFailed",
            Signal::Unloading => "unloading",
            Signal::Unloaded => "unloaded",
            Signal::UnloadFailed => "unloadFailed",
            Signal::Starting => "starting",
            Signal::Started => "started",
            Signal::StartFailed => "startFailed",
            Signal::Pausing => "pausing",
            Signal::Paused => "paused",
            Signal::PauseFailed => "pauseFailed",
            Signal::Resuming => "resuming",
            Signal::Resumed => "resumed",
            Signal::ResumeFailed => "resumeFailed",
            Signal::Stopping => "stopping",
            Signal::Stopped => "stopped",
            Signal::StopFailed => "stopFailed",
            Signal::Finished => "finished",
            Signal::FinishedWithError => "finishedWithError",
            Signal::Synchronized => "synchronized",
            Signal::Desynchronized => "desynchronized",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compact set of signals (one bit per [`Signal::id`]).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SignalSet(u64);

impl SignalSet {
    pub const EMPTY: SignalSet = SignalSet(0);

    pub const fn with(self, signal: Signal) -> Self {
        SignalSet(self.0 | (1 << signal.id()))
    }

    pub const fn contains(self, signal: Signal) -> bool {
        self.0 & (1 << signal.id()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<I: IntoIterator<Item = Signal>>(iter: I) -> Self {
        iter.into_iter().fold(SignalSet::EMPTY, SignalSet::with)
    }
}

/// Values carried alongside a signal.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    None,

    /// `stateChanged(current, previous)`.
    StateChange { current: State, previous: State },

    /// `suppressionChanged` / `flagChanged(name, current, previous)`.
    Flag {
        name: &'static str,
        current: bool,
        previous: bool,
    },

    /// Failure signals and `finishedWithError`.
    Error(CoreError),

    /// `finished`, with an optional summary of the run result.
    Report(Option<String>),
}

/// One emission: the signal plus its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub signal: Signal,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(signal: Signal, payload: EventPayload) -> Self {
        Self { signal, payload }
    }

    /// Event without payload.
    pub fn bare(signal: Signal) -> Self {
        Self::new(signal, EventPayload::None)
    }

    pub fn state_changed(current: State, previous: State) -> Self {
        Self::new(
            Signal::StateChanged,
            EventPayload::StateChange { current, previous },
        )
    }

    pub fn failure(signal: Signal, error: CoreError) -> Self {
        Self::new(signal, EventPayload::Error(error))
    }

    /// New state carried by a `stateChanged` event.
    pub fn new_state(&self) -> Option<State> {
        match self.payload {
            EventPayload::StateChange { current, .. } => Some(current),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match &self.payload {
            EventPayload::Error(e) => Some(e),
            _ => None,
        }
    }
}
