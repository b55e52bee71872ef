use crate::error::{CoreError, Result};

use super::{Layers, Operation, State, ALL_OPERATIONS};

/// Ephemeral record of one guarded transition.
///
/// Built by [`begin`] and consumed by [`finish`]; it only exists so the caller
/// knows where to go on success and what to roll back to on failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionAttempt {
    pub operation: Operation,
    pub previous: State,
    pub transitional: State,
    pub target: State,
    pub rollback: State,
}

/// Outcome of the guard step.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Admission {
    /// Guard passed: move to `attempt.transitional` and run the handler.
    Proceed(TransitionAttempt),
    /// Nothing to do (pause while paused, resume while running).
    Settled,
}

/// Begin a transition from `current` using the default guard of `via`.
pub fn begin(current: State, via: Operation) -> Result<Admission> {
    begin_guarded(current, via, via.permits(current))
}

/// Begin a transition whose guard has already been evaluated by the caller.
///
/// The idempotent pause/resume paths take precedence over the guard.
pub fn begin_guarded(current: State, via: Operation, guard: bool) -> Result<Admission> {
    if via.is_settled(current) {
        return Ok(Admission::Settled);
    }

    if !guard {
        return Err(CoreError::invalid_state_lifecycle(
            current.id(),
            via.id(),
            format!("{via} is not permitted with state {current}"),
        ));
    }

    Ok(Admission::Proceed(TransitionAttempt {
        operation: via,
        previous: current,
        transitional: via.transitional(),
        target: via.target(),
        rollback: via.rollback(current),
    }))
}

/// Finish a transition based on the handler outcome.
pub fn finish(attempt: &TransitionAttempt, handler_succeeded: bool) -> State {
    if handler_succeeded {
        attempt.target
    } else {
        attempt.rollback
    }
}

/// Expected state after `via` succeeds from `start`.
pub fn goal_state_for_operation(start: State, via: Operation) -> Result<State> {
    match begin(start, via)? {
        Admission::Proceed(attempt) => Ok(finish(&attempt, true)),
        Admission::Settled => Ok(start),
    }
}

/// Operations a component composing `layers` may start from `state`.
///
/// Idempotent no-ops are not listed; transitional states offer nothing.
pub fn available_operations(layers: Layers, state: State) -> Vec<Operation> {
    ALL_OPERATIONS
        .into_iter()
        .filter(|op| layers.contains(op.layer()) && op.permits(state))
        .collect()
}

//
// Tests
//
