use std::fmt::Write as _;
use std::sync::{Arc, Weak};
use std::time::Duration;

use statekit_core::error::{CoreError, Domain, ErrorKind, Result};
use statekit_core::lifecycle::{Event, Signal, State};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::component::Observable;
use crate::config::Config;
use crate::logging::Logger;
use crate::notifier::SubscriptionId;

struct WaitEntry {
    id: Uuid,
    name: String,
    target: Weak<dyn Observable>,
    last_known: Option<State>,
}

/// One-shot helper that waits until every registered component is in one state.
///
/// ```ignore
/// StateWaiter::new()
///     .watch(&db)
///     .watch(&cache)
///     .timeout(Some(Duration::from_secs(2)))
///     .wait()
///     .await?;
/// ```
pub struct StateWaiter {
    config: Config,
    entries: Vec<WaitEntry>,
    timeout: Duration,
    target: State,
    logger: Logger,
}

impl Default for StateWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateWaiter {
    pub fn new() -> Self {
        Self::with_config(Config::from_env())
    }

    pub fn with_config(config: Config) -> Self {
        let logger = match &config.logger_name {
            Some(name) => Logger::named(name).of("StateWaiter"),
            None => Logger::named("StateWaiter"),
        };
        Self {
            entries: Vec::new(),
            timeout: config.wait_timeout,
            target: config.target_state,
            logger,
            config,
        }
    }

    pub fn watch<T>(self, component: &Arc<T>) -> Self
    where
        T: Observable + 'static,
    {
        let component: Arc<dyn Observable> = component.clone();
        self.watch_weak(Arc::downgrade(&component))
    }

    /// Register a component by weak reference. Dead references are skipped.
    pub fn watch_weak(mut self, component: Weak<dyn Observable>) -> Self {
        let Some(alive) = component.upgrade() else {
            self.logger
                .warn(format_args!("ignoring a component that no longer exists"));
            return self;
        };
        let entry = WaitEntry {
            id: Uuid::new_v4(),
            name: alive.name().to_string(),
            target: component,
            last_known: Some(alive.state()),
        };
        self.logger
            .trace(format_args!("[id:{}] watching '{}'", entry.id, entry.name));
        self.entries.push(entry);
        self
    }

    pub fn watch_all<I>(self, components: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Observable>>,
    {
        components
            .into_iter()
            .fold(self, |waiter, c| waiter.watch_weak(Arc::downgrade(&c)))
    }

    /// `None` restores the configured timeout; a zero duration is ignored.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        match timeout {
            None => self.timeout = self.config.wait_timeout,
            Some(d) if d.is_zero() => {
                self.logger.warn(format_args!("ignoring a zero timeout"));
            }
            Some(d) => self.timeout = d,
        }
        self
    }

    /// `None` restores the configured target; blank or unknown names are ignored.
    pub fn state_name(mut self, name: Option<&str>) -> Self {
        match name {
            None => self.target = self.config.target_state,
            Some(n) if n.trim().is_empty() => {
                self.logger.warn(format_args!("ignoring a blank state name"));
            }
            Some(n) => match n.parse::<State>() {
                Ok(state) => self.target = state,
                Err(e) => self.logger.warn(format_args!("ignoring state name: {}", e.message)),
            },
        }
        self
    }

    pub fn target_state(&self) -> State {
        self.target
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve once all registered components are in the target state at the same
    /// time, or fail with a timeout listing every component.
    pub async fn wait(mut self) -> Result<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let wake = Arc::new(Notify::new());
        let subscriptions = self.subscribe_all(&wake);

        let target = self.target;
        let entries = &mut self.entries;
        let outcome = tokio::time::timeout(self.timeout, async {
            loop {
                if all_in(entries, target) {
                    return;
                }
                wake.notified().await;
            }
        })
        .await;

        for (component, id) in subscriptions {
            if let Some(component) = component.upgrade() {
                component.unsubscribe(id);
            }
        }

        match outcome {
            Ok(()) => {
                self.logger.debug(format_args!(
                    "{} component(s) reached {target}",
                    self.entries.len()
                ));
                Ok(())
            }
            Err(_) => {
                let err = self.timeout_error();
                crate::error::log_core_error(&self.logger, &err);
                Err(err)
            }
        }
    }

    fn subscribe_all(&self, wake: &Arc<Notify>) -> Vec<(Weak<dyn Observable>, SubscriptionId)> {
        let mut subscriptions = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let Some(component) = entry.target.upgrade() else {
                continue;
            };
            let wake = Arc::clone(wake);
            let id = component.subscribe(
                Some(Signal::StateChanged),
                Arc::new(move |_ev: &Event| wake.notify_one()),
            );
            subscriptions.push((entry.target.clone(), id));
        }
        subscriptions
    }

    fn timeout_error(&self) -> CoreError {
        let mut message = format!(
            "timed out after {} ms waiting for state {}",
            self.timeout.as_millis(),
            self.target
        );
        for entry in &self.entries {
            let state = entry
                .last_known
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());
            let _ = write!(
                message,
                "\n[id:{}] name={} currentState={} ready={}",
                entry.id,
                entry.name,
                state,
                entry.last_known == Some(State::Ready)
            );
        }

        CoreError::warn()
            .domain(Domain::Waiter)
            .kind(ErrorKind::Timeout)
            .msg(message)
            .build()
    }
}

/// Refresh every entry's last known state; true when all are in `target`.
fn all_in(entries: &mut [WaitEntry], target: State) -> bool {
    let mut all = true;
    for entry in entries.iter_mut() {
        match entry.target.upgrade() {
            Some(component) => entry.last_known = Some(component.state()),
            None => {
                all = false;
                continue;
            }
        }
        if entry.last_known != Some(target) {
            all = false;
        }
    }
    all
}
