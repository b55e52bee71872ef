//! statekit
//!
//! Async lifecycle components on tokio.
//! Provides components with guarded, signalled transitions, a watcher that
//! aggregates the states of several components, and a one-shot waiter,
//! while keeping core semantics in `statekit_core`.

// Public modules
pub mod component;
pub mod config;
pub mod error;
pub mod logging;
pub mod notifier;
pub mod waiter;
pub mod watcher;

pub use component::{Component, ComponentBuilder, HandlerFuture, Handlers, NoopHandlers, Observable};
pub use config::Config;
pub use notifier::{Callback, SubscriptionId};
pub use waiter::StateWaiter;
pub use watcher::{StateWatcher, WatchOptions};

// Re-export core types that users will commonly need
pub use statekit_core::error::{CoreError, ErrorKind, Result};
pub use statekit_core::lifecycle::{
    transition_graph, Event, EventPayload, Layer, Layers, Operation, Signal, State,
};
