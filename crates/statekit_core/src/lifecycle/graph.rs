use crate::error::Result;

use super::{available_operations, goal_state_for_operation, Layers, Operation, State};

/// Transition graph of a composed state machine, derived from the operation table.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TransitionGraph {
    pub states: Vec<State>,
    pub transitions: Vec<TransitionEdge>,
}

/// Directed transition edge.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TransitionEdge {
    pub start: State,
    pub operation: Operation,
    pub goal: State,
}

/// Build the transition graph for a component composing `layers`.
pub fn transition_graph(layers: Layers) -> Result<TransitionGraph> {
    let states: Vec<State> = layers.states().iter().collect();
    let mut transitions = Vec::new();

    for &state in &states {
        for operation in available_operations(layers, state) {
            let goal = goal_state_for_operation(state, operation)?;
            transitions.push(TransitionEdge {
                start: state,
                operation,
                goal,
            });
        }
    }

    Ok(TransitionGraph {
        states,
        transitions,
    })
}
