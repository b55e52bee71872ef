use std::fmt;

use super::{Layer, Signal, State};

/// User-invoked lifecycle operations.
///
/// Each operation is one row of the transition table: guard, transitional state,
/// target state, rollback state and its three signals.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Operation {
    Initialize,
    Finalize,
    Connect,
    Disconnect,
    Load,
    Unload,
    Start,
    Stop,
    Pause,
    Resume,
}

/// Canonical list of all operations.
pub const ALL_OPERATIONS: [Operation; 10] = [
    Operation::Initialize,
    Operation::Finalize,
    Operation::Connect,
    Operation::Disconnect,
    Operation::Load,
    Operation::Unload,
    Operation::Start,
    Operation::Stop,
    Operation::Pause,
    Operation::Resume,
];

impl Operation {
    /// Internal, compact IDs used for error payloads.
    pub const fn id(self) -> u8 {
        match self {
            Operation::Initialize => 1,
            Operation::Finalize => 2,
            Operation::Connect => 3,
            Operation::Disconnect => 4,
            Operation::Load => 5,
            Operation::Unload => 6,
            Operation::Start => 7,
            Operation::Stop => 8,
            Operation::Pause => 9,
            Operation::Resume => 10,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Operation::Initialize => "initialize",
            Operation::Finalize => "finalize",
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
            Operation::Load => "load",
            Operation::Unload => "unload",
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
        }
    }

    /// Layer a component must compose to offer this operation.
    pub const fn layer(self) -> Layer {
        match self {
            Operation::Initialize | Operation::Finalize => Layer::Lifecycle,
            Operation::Connect | Operation::Disconnect => Layer::Connectable,
            Operation::Load | Operation::Unload => Layer::Loadable,
            Operation::Start | Operation::Stop | Operation::Pause | Operation::Resume => {
                Layer::Runnable
            }
        }
    }

    /// Default guard predicate.
    pub const fn permits(self, current: State) -> bool {
        match self {
            Operation::Initialize => matches!(current, State::NotInitialized),
            Operation::Finalize | Operation::Connect | Operation::Load => {
                matches!(current, State::Initialized | State::Ready)
            }
            Operation::Disconnect | Operation::Unload | Operation::Start => {
                matches!(current, State::Ready)
            }
            Operation::Stop => matches!(current, State::Running | State::Paused),
            Operation::Pause => matches!(current, State::Running),
            Operation::Resume => matches!(current, State::Paused),
        }
    }

    /// States in which the operation resolves successfully without doing anything.
    pub const fn is_settled(self, current: State) -> bool {
        match self {
            Operation::Pause => matches!(current, State::Paused | State::Pausing),
            Operation::Resume => matches!(current, State::Running | State::Resuming),
            _ => false,
        }
    }

    pub const fn transitional(self) -> State {
        match self {
            Operation::Initialize => State::Initializing,
            Operation::Finalize => State::Finalizing,
            Operation::Connect => State::Connecting,
            Operation::Disconnect => State::Disconnecting,
            Operation::Load => State::Loading,
            Operation::Unload => State::Unloading,
            Operation::Start => State::Starting,
            Operation::Stop => State::Stopping,
            Operation::Pause => State::Pausing,
            Operation::Resume => State::Resuming,
        }
    }

    pub const fn target(self) -> State {
        match self {
            Operation::Initialize => State::Initialized,
            Operation::Finalize => State::NotInitialized,
            Operation::Connect | Operation::Load => State::Ready,
            Operation::Disconnect | Operation::Unload => State::Initialized,
            Operation::Start | Operation::Resume => State::Running,
            Operation::Stop => State::Ready,
            Operation::Pause => State::Paused,
        }
    }

    /// State restored after a failed handler, given the state before the attempt.
    pub const fn rollback(self, previous: State) -> State {
        match self {
            Operation::Initialize => State::NotInitialized,
            Operation::Start => State::Ready,
            Operation::Pause => State::Running,
            Operation::Resume => State::Paused,
            _ => previous,
        }
    }

    /// Emitted right after entering the transitional state.
    pub const fn pre_signal(self) -> Signal {
        match self {
            Operation::Initialize => Signal::Initializing,
            Operation::Finalize => Signal::Finalizing,
            Operation::Connect => Signal::Connecting,
            Operation::Disconnect => Signal::Disconnecting,
            Operation::Load => Signal::Loading,
            Operation::Unload => Signal::Unloading,
            Operation::Start => Signal::Starting,
            Operation::Stop => Signal::Stopping,
            Operation::Pause => Signal::Pausing,
            Operation::Resume => Signal::Resuming,
        }
    }

    pub const fn success_signal(self) -> Signal {
        match self {
            Operation::Initialize => Signal::InitializationSucceeded,
            Operation::Finalize => Signal::FinalizationSucceeded,
            Operation::Connect => Signal::Connected,
            Operation::Disconnect => Signal::Disconnected,
            Operation::Load => Signal::Loaded,
            Operation::Unload => Signal::Unloaded,
            Operation::Start => Signal::Started,
            Operation::Stop => Signal::Stopped,
            Operation::Pause => Signal::Paused,
            Operation::Resume => Signal::Resumed,
        }
    }

    pub const fn failure_signal(self) -> Signal {
        match self {
            Operation::Initialize => Signal::InitializationFailed,
            Operation::Finalize => Signal::FinalizationFailed,
            Operation::Connect => Signal::ConnectionFailed,
            Operation::Disconnect => Signal::DisconnectionFailed,
            Operation::Load => Signal::LoadFailed,
            Operation::Unload => Signal::UnloadFailed,
            Operation::Start => Signal::StartFailed,
            Operation::Stop => Signal::StopFailed,
            Operation::Pause => Signal::PauseFailed,
            Operation::Resume => Signal::ResumeFailed,
        }
    }

    /// Connect and load additionally announce `ready` on success.
    pub const fn announces_ready(self) -> bool {
        matches!(self, Operation::Connect | Operation::Load)
    }

    /// The operation that undoes this one, when there is one.
    pub const fn reverse(self) -> Operation {
        match self {
            Operation::Initialize => Operation::Finalize,
            Operation::Finalize => Operation::Initialize,
            Operation::Connect => Operation::Disconnect,
            Operation::Disconnect => Operation::Connect,
            Operation::Load => Operation::Unload,
            Operation::Unload => Operation::Load,
            Operation::Start => Operation::Stop,
            Operation::Stop => Operation::Start,
            Operation::Pause => Operation::Resume,
            Operation::Resume => Operation::Pause,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
