//! statekit_core::lifecycle
//!
//! Pure (runtime-agnostic) lifecycle semantics.
//! This module intentionally contains **no** async code and no subscriber storage.
//!
//! Key ideas:
//! - States and signals come in per-layer fragments; a component's valid sets are the union
//! - One operation table drives every capability: guard, transitional, target, rollback, signals
//! - Explicit transition pipeline: `begin()` -> handler -> `finish()`
//! - The async crate owns handler invocation, emission and locking

mod engine;
mod gate;
mod graph;
mod layer;
mod operation;
mod signal;
mod state;

pub use engine::{
    available_operations, begin, begin_guarded, finish, goal_state_for_operation, Admission,
    TransitionAttempt,
};
pub use gate::SignalGate;
pub use graph::{transition_graph, TransitionEdge, TransitionGraph};
pub use layer::{Layer, Layers, ALL_LAYERS};
pub use operation::{Operation, ALL_OPERATIONS};
pub use signal::{Event, EventPayload, Signal, SignalSet};
pub use state::{State, StateSet, ALL_STATES};
