use statekit_core::error::ErrorKind;
use statekit_core::lifecycle::{
    available_operations, begin, begin_guarded, finish, goal_state_for_operation, transition_graph,
    Admission, Layer, Layers, Operation, Signal, State,
};

fn proceed(start: State, op: Operation) -> statekit_core::lifecycle::TransitionAttempt {
    match begin(start, op).expect("begin should succeed") {
        Admission::Proceed(attempt) => attempt,
        Admission::Settled => panic!("{op} from {start} unexpectedly settled"),
    }
}

#[test]
fn success_moves_to_expected_goal_state() {
    let cases = [
        (State::NotInitialized, Operation::Initialize, State::Initialized),
        (State::Initialized, Operation::Finalize, State::NotInitialized),
        (State::Ready, Operation::Finalize, State::NotInitialized),
        (State::Initialized, Operation::Connect, State::Ready),
        (State::Ready, Operation::Disconnect, State::Initialized),
        (State::Initialized, Operation::Load, State::Ready),
        (State::Ready, Operation::Unload, State::Initialized),
        (State::Ready, Operation::Start, State::Running),
        (State::Running, Operation::Stop, State::Ready),
        (State::Paused, Operation::Stop, State::Ready),
        (State::Running, Operation::Pause, State::Paused),
        (State::Paused, Operation::Resume, State::Running),
    ];

    for (start, op, expected_goal) in cases {
        let attempt = proceed(start, op);
        assert_eq!(attempt.previous, start);
        assert_eq!(attempt.transitional, op.transitional());
        assert_eq!(finish(&attempt, true), expected_goal, "{op} from {start}");
        assert_eq!(goal_state_for_operation(start, op).unwrap(), expected_goal);
    }
}

#[test]
fn failure_returns_to_origin_state() {
    let cases = [
        (State::NotInitialized, Operation::Initialize),
        (State::Initialized, Operation::Finalize),
        (State::Ready, Operation::Finalize),
        (State::Initialized, Operation::Connect),
        (State::Ready, Operation::Connect),
        (State::Ready, Operation::Disconnect),
        (State::Initialized, Operation::Load),
        (State::Ready, Operation::Unload),
        (State::Ready, Operation::Start),
        (State::Running, Operation::Stop),
        (State::Paused, Operation::Stop),
        (State::Running, Operation::Pause),
        (State::Paused, Operation::Resume),
    ];

    for (start, op) in cases {
        let attempt = proceed(start, op);
        assert_eq!(finish(&attempt, false), start, "{op} from {start}");
    }
}

#[test]
fn busy_state_rejection_is_deterministic() {
    let err = begin(State::Connecting, Operation::Connect).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    let err = begin(State::Initializing, Operation::Initialize).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);

    let all: Layers = [Layer::Connectable, Layer::Loadable, Layer::Runnable]
        .into_iter()
        .collect();
    for state in all.states().iter().filter(|s| s.is_transitioning()) {
        assert!(available_operations(all, state).is_empty());
    }
}

#[test]
fn pause_and_resume_noops_are_settled_even_with_a_closed_guard() {
    assert_eq!(begin(State::Paused, Operation::Pause).unwrap(), Admission::Settled);
    assert_eq!(begin(State::Pausing, Operation::Pause).unwrap(), Admission::Settled);
    assert_eq!(begin(State::Running, Operation::Resume).unwrap(), Admission::Settled);
    assert_eq!(
        begin_guarded(State::Resuming, Operation::Resume, false).unwrap(),
        Admission::Settled
    );
    assert!(begin(State::Ready, Operation::Pause).is_err());
    assert!(begin(State::Ready, Operation::Resume).is_err());
}

#[test]
fn watcher_layer_adds_signals_but_no_states() {
    let runnable = Layers::new().with(Layer::Runnable);
    let watcher = Layers::new().with(Layer::Watcher);

    assert_eq!(runnable.states(), watcher.states());
    assert!(watcher.signals().contains(Signal::Synchronized));
    assert!(watcher.signals().contains(Signal::Desynchronized));
    assert!(!runnable.signals().contains(Signal::Synchronized));
}

#[test]
fn runnable_graph_matches_operation_table() {
    let layers = Layers::new().with(Layer::Runnable);
    let graph = transition_graph(layers).expect("transition graph should build");

    for edge in &graph.transitions {
        assert!(graph.states.contains(&edge.start));
        assert!(graph.states.contains(&edge.goal));
        assert!(edge.operation.permits(edge.start));
        assert_eq!(
            goal_state_for_operation(edge.start, edge.operation).unwrap(),
            edge.goal
        );
    }

    assert!(graph.transitions.iter().any(|e| {
        e.start == State::Ready && e.operation == Operation::Start && e.goal == State::Running
    }));
    assert!(!graph
        .transitions
        .iter()
        .any(|e| e.operation == Operation::Connect));
}
