use std::env;
use std::time::Duration;

use statekit_core::lifecycle::State;

pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_TARGET_STATE: State = State::Ready;

pub const ENV_WAIT_TIMEOUT_MS: &str = "STATEKIT_WAIT_TIMEOUT_MS";
pub const ENV_TARGET_STATE: &str = "STATEKIT_TARGET_STATE";
pub const ENV_LOGGER: &str = "STATEKIT_LOGGER";

/// Process-level defaults for watchers and waiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Timeout used by a waiter when none (or `None`) was given.
    pub wait_timeout: Duration,
    /// State watchers and waiters aim for when no target was given.
    pub target_state: State,
    /// Registry name used to resolve the default log sink.
    pub logger_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            target_state: DEFAULT_TARGET_STATE,
            logger_name: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; malformed values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = lookup(ENV_WAIT_TIMEOUT_MS).and_then(parse_positive_ms) {
            config.wait_timeout = Duration::from_millis(ms);
        }
        if let Some(state) = lookup(ENV_TARGET_STATE).and_then(|v| v.parse::<State>().ok()) {
            config.target_state = state;
        }
        config.logger_name = lookup(ENV_LOGGER)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        config
    }
}

fn parse_positive_ms(value: String) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|ms| *ms > 0)
}
