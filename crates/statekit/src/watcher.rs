//! statekit::watcher
//!
//! A runnable component that observes other components and reports whether all of
//! them sit in one target state.
//!
//! - initialize: validate the watch list, create one entry per component
//! - start/resume: subscribe to every `stateChanged`, snapshot, recompute
//! - pause/stop: unsubscribe; cached states and the synchronized flag are kept
//!
//! Recomputation runs on a spawned task woken through a `Notify`; a burst of
//! changes before the task runs costs one recomputation and at most one edge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use statekit_core::error::{CoreError, Domain, Result};
use statekit_core::lifecycle::{Event, Layer, Signal, State};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::component::{Component, HandlerFuture, Handlers, Observable};
use crate::config::Config;
use crate::logging::Logger;
use crate::notifier::{Callback, SubscriptionId};

/// What a watcher observes and which state it waits for.
#[derive(Clone, Default)]
pub struct WatchOptions {
    pub components: Vec<Arc<dyn Observable>>,
    /// State name; `None` uses the configured default target.
    pub target_state: Option<String>,
}

impl WatchOptions {
    pub fn new(components: Vec<Arc<dyn Observable>>) -> Self {
        Self {
            components,
            target_state: None,
        }
    }

    pub fn target_state(mut self, name: impl Into<String>) -> Self {
        self.target_state = Some(name.into());
        self
    }
}

struct WatchEntry {
    target: Weak<dyn Observable>,
    name: String,
    last_known: Option<State>,
    subscription: Option<SubscriptionId>,
}

struct WatcherInner {
    component: Component,
    config: Config,
    pending: Mutex<Option<WatchOptions>>,
    entries: Mutex<Vec<WatchEntry>>,
    target: Mutex<Option<State>>,
    synchronized: AtomicBool,
    wake: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Aggregates the states of several components into one synchronized flag.
///
/// Holds only weak references to the watched components.
pub struct StateWatcher {
    inner: Arc<WatcherInner>,
}

impl StateWatcher {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        Self::with_config(name, Config::from_env())
    }

    pub fn with_config(name: impl Into<String>, config: Config) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CoreError::invalid_argument(
                Domain::Watcher,
                "watcher name must not be empty",
            ));
        }
        let logger = match &config.logger_name {
            Some(registered) => Logger::named(registered).of(&name),
            None => Logger::named(&name),
        };

        let inner = Arc::new_cyclic(|weak: &Weak<WatcherInner>| WatcherInner {
            component: Component::builder(name.clone())
                .layer(Layer::Watcher)
                .handlers(WatcherHandlers {
                    inner: weak.clone(),
                })
                .logger(logger)
                .ready_on_initialize(true)
                .assemble(name),
            config,
            pending: Mutex::new(None),
            entries: Mutex::new(Vec::new()),
            target: Mutex::new(None),
            synchronized: AtomicBool::new(false),
            wake: Arc::new(Notify::new()),
            task: Mutex::new(None),
        });

        Ok(Self { inner })
    }

    /// Validate `options` and build the watch list; on success the watcher is `Ready`.
    pub async fn initialize(&self, options: WatchOptions) -> Result<()> {
        *self.inner.pending.lock() = Some(options);
        let result = self.inner.component.initialize().await;
        self.inner.pending.lock().take();
        result
    }

    pub async fn finalize(&self) -> Result<()> {
        self.inner.component.finalize().await
    }

    pub async fn start(&self) -> Result<()> {
        self.inner.component.start().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.inner.component.stop().await
    }

    pub async fn pause(&self) -> Result<()> {
        self.inner.component.pause().await
    }

    pub async fn resume(&self) -> Result<()> {
        self.inner.component.resume().await
    }

    pub fn is_synchronized(&self) -> bool {
        self.inner.synchronized.load(Ordering::Acquire)
    }

    /// Target state, once initialized.
    pub fn target_state(&self) -> Option<State> {
        *self.inner.target.lock()
    }

    /// Number of watched components.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying lifecycle component.
    pub fn component(&self) -> &Component {
        &self.inner.component
    }

    pub fn state(&self) -> State {
        self.inner.component.state()
    }

    pub fn on<F>(&self, signal: Signal, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.component.on(signal, callback)
    }
}

impl Observable for StateWatcher {
    fn name(&self) -> &str {
        self.inner.component.name()
    }

    fn state(&self) -> State {
        self.inner.component.state()
    }

    fn subscribe(&self, filter: Option<Signal>, callback: Callback) -> SubscriptionId {
        self.inner.component.subscribe(filter, callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.component.unsubscribe(id)
    }
}

impl WatcherInner {
    fn logger(&self) -> &Logger {
        self.component.logger()
    }

    fn prepare(&self) -> Result<()> {
        let options = self.pending.lock().take().ok_or_else(|| {
            CoreError::invalid_argument(Domain::Watcher, "initialize needs watch options")
        })?;

        if options.components.is_empty() {
            return Err(CoreError::invalid_argument(
                Domain::Watcher,
                "watch list must not be empty",
            ));
        }

        let target = match options.target_state.as_deref() {
            None => self.config.target_state,
            Some(name) if name.trim().is_empty() => {
                return Err(CoreError::invalid_argument(
                    Domain::Watcher,
                    "target state must not be blank",
                ));
            }
            Some(name) => name.parse::<State>().map_err(|e| {
                CoreError::invalid_argument(Domain::Watcher, e.message.clone())
            })?,
        };

        let entries = options
            .components
            .iter()
            .map(|c| WatchEntry {
                target: Arc::downgrade(c),
                name: c.name().to_string(),
                last_known: None,
                subscription: None,
            })
            .collect::<Vec<_>>();

        self.logger().debug(format_args!(
            "watching {} component(s) for {target}",
            entries.len()
        ));
        *self.entries.lock() = entries;
        *self.target.lock() = Some(target);
        Ok(())
    }

    /// Subscribe to every watched component and start the recompute task.
    fn attach(self: &Arc<Self>) {
        self.spawn_recompute_task();

        let mut entries = self.entries.lock();
        for (index, entry) in entries.iter_mut().enumerate() {
            let Some(target) = entry.target.upgrade() else {
                self.logger()
                    .warn(format_args!("watched component '{}' is gone", entry.name));
                continue;
            };
            if entry.subscription.is_none() {
                let weak = Arc::downgrade(self);
                entry.subscription = Some(target.subscribe(
                    Some(Signal::StateChanged),
                    Arc::new(move |ev: &Event| {
                        if let (Some(inner), Some(state)) = (weak.upgrade(), ev.new_state()) {
                            inner.observe(index, state);
                        }
                    }),
                ));
            }
            entry.last_known = Some(target.state());
        }
        drop(entries);

        self.wake.notify_one();
    }

    /// Remove every subscription and stop the recompute task.
    fn detach(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        for entry in self.entries.lock().iter_mut() {
            if let Some(id) = entry.subscription.take() {
                if let Some(target) = entry.target.upgrade() {
                    target.unsubscribe(id);
                }
            }
        }
    }

    fn spawn_recompute_task(self: &Arc<Self>) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }
        let weak = Arc::downgrade(self);
        let wake = Arc::clone(&self.wake);
        *task = Some(tokio::spawn(async move {
            loop {
                wake.notified().await;
                match weak.upgrade() {
                    Some(inner) => inner.recompute(),
                    None => break,
                }
            }
        }));
    }

    /// Record the live state; nested emission can deliver an older payload last.
    fn observe(&self, index: usize, reported: State) {
        if let Some(entry) = self.entries.lock().get_mut(index) {
            let live = entry.target.upgrade().map(|t| t.state());
            entry.last_known = Some(live.unwrap_or(reported));
        }
        self.wake.notify_one();
    }

    fn recompute(&self) {
        let Some(target) = *self.target.lock() else {
            return;
        };

        let synchronized = {
            let entries = self.entries.lock();
            let mut in_target = 0;
            for entry in entries.iter() {
                if entry.target.strong_count() == 0 {
                    self.logger().warn(format_args!(
                        "watched component '{}' is gone, counting it as out of sync",
                        entry.name
                    ));
                    continue;
                }
                if entry.last_known == Some(target) {
                    in_target += 1;
                }
            }
            !entries.is_empty() && in_target == entries.len()
        };

        let previous = self.synchronized.swap(synchronized, Ordering::AcqRel);
        if previous == synchronized {
            return;
        }
        self.logger()
            .debug(format_args!("synchronized {previous} -> {synchronized}"));
        let signal = if synchronized {
            Signal::Synchronized
        } else {
            Signal::Desynchronized
        };
        self.component.emit(Event::bare(signal));
    }
}

impl Drop for WatcherInner {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Transition handlers of the watcher's own component.
struct WatcherHandlers {
    inner: Weak<WatcherInner>,
}

impl WatcherHandlers {
    fn with_inner<F>(&self, f: F) -> HandlerFuture<'_>
    where
        F: FnOnce(&Arc<WatcherInner>) -> Result<()>,
    {
        let result = match self.inner.upgrade() {
            Some(inner) => f(&inner),
            None => Err(CoreError::handler_msg("watcher is being dropped")),
        };
        Box::pin(std::future::ready(result))
    }
}

impl Handlers for WatcherHandlers {
    fn handle_initialization(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| inner.prepare())
    }

    fn handle_finalization(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| {
            inner.detach();
            inner.entries.lock().clear();
            *inner.target.lock() = None;
            inner.synchronized.store(false, Ordering::Release);
            Ok(())
        })
    }

    fn handle_start(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| {
            inner.attach();
            Ok(())
        })
    }

    fn handle_resume(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| {
            inner.attach();
            Ok(())
        })
    }

    fn handle_pause(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| {
            inner.detach();
            Ok(())
        })
    }

    fn handle_stop(&self) -> HandlerFuture<'_> {
        self.with_inner(|inner| {
            inner.detach();
            Ok(())
        })
    }
}
