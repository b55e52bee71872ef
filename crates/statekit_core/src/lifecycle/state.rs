use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Domain};

/// Every state a statekit component can occupy.
///
/// Which of these a given component may actually enter depends on the layers it
/// composes (see [`Layer::states`](super::Layer::states)).
///
/// Stable states:
/// - None, Ready, NotInitialized, Initialized, Running, Paused
///
/// Transitional states (entered while a handler is pending):
/// - Initializing, Finalizing, Connecting, Disconnecting, Loading, Unloading,
///   Starting, Pausing, Resuming, Stopping, Finishing
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum State {
    // Base
    None,
    Ready,

    // Lifecycle
    NotInitialized,
    Initializing,
    Initialized,
    Finalizing,

    // Connectable
    Connecting,
    Disconnecting,

    // Loadable
    Loading,
    Unloading,

    // Runnable
    Starting,
    Running,
    Pausing,
    Paused,
    Resuming,
    Stopping,
    Finishing,
}

/// Internal, compact IDs used for error payloads and set membership.
impl State {
    pub const fn id(self) -> u8 {
        match self {
            State::None => 0,
            State::Ready => 1,
            State::NotInitialized => 2,
            State::Initializing => 3,
            State::Initialized => 4,
            State::Finalizing => 5,
            State::Connecting => 6,
            State::Disconnecting => 7,
            State::Loading => 8,
            State::Unloading => 9,
            State::Starting => 10,
            State::Running => 11,
            State::Pausing => 12,
            State::Paused => 13,
            State::Resuming => 14,
            State::Stopping => 15,
            State::Finishing => 16,
        }
    }

    /// True for intermediate states entered while a handler is running.
    pub const fn is_transitioning(self) -> bool {
        matches!(
            self,
            State::Initializing
                | State::Finalizing
                | State::Connecting
                | State::Disconnecting
                | State::Loading
                | State::Unloading
                | State::Starting
                | State::Pausing
                | State::Resuming
                | State::Stopping
                | State::Finishing
        )
    }

    /// Stable, human-readable label. Also the accepted input of `FromStr`.
    pub const fn label(self) -> &'static str {
        match self {
            State::None => "None",
            State::Ready => "Ready",
            State::NotInitialized => "NotInitialized",
            State::Initializing => "Initializing",
            State::Initialized => "Initialized",
            State::Finalizing => "Finalizing",
            State::Connecting => "Connecting",
            State::Disconnecting => "Disconnecting",
            State::Loading => "Loading",
            State::Unloading => "Unloading",
            State::Starting => "Starting",
            State::Running => "Running",
            State::Pausing => "Pausing",
            State::Paused => "Paused",
            State::Resuming => "Resuming",
            State::Stopping => "Stopping",
            State::Finishing => "Finishing",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for State {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_STATES
            .into_iter()
            .find(|state| state.label() == wanted)
            .ok_or_else(|| {
                CoreError::warn()
                    .domain(Domain::Lifecycle)
                    .kind(crate::error::ErrorKind::InvalidArgument)
                    .msgf(format_args!("unknown state name '{wanted}'"))
                    .build()
            })
    }
}

/// Canonical list of all states, ordered by id.
pub const ALL_STATES: [State; 17] = [
    State::None,
    State::Ready,
    State::NotInitialized,
    State::Initializing,
    State::Initialized,
    State::Finalizing,
    State::Connecting,
    State::Disconnecting,
    State::Loading,
    State::Unloading,
    State::Starting,
    State::Running,
    State::Pausing,
    State::Paused,
    State::Resuming,
    State::Stopping,
    State::Finishing,
];

/// Compact set of states (one bit per [`State::id`]).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct StateSet(u32);

impl StateSet {
    pub const EMPTY: StateSet = StateSet(0);

    pub const fn with(self, state: State) -> Self {
        StateSet(self.0 | (1 << state.id()))
    }

    pub const fn contains(self, state: State) -> bool {
        self.0 & (1 << state.id()) != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = State> {
        ALL_STATES.into_iter().filter(move |s| self.contains(*s))
    }
}

impl FromIterator<State> for StateSet {
    fn from_iter<I: IntoIterator<Item = State>>(iter: I) -> Self {
        iter.into_iter().fold(StateSet::EMPTY, StateSet::with)
    }
}
