use std::sync::{Arc, Mutex};

use statekit::component::{succeed, HandlerFuture, Handlers};
use statekit::logging::{Level, Logger, MemorySink};
use statekit::{Component, CoreError, ErrorKind, Event, EventPayload, Layer, Operation, Signal, State};
use tokio::sync::Notify;

/// Handlers that fail the listed operations with "boom".
#[derive(Default)]
struct Scripted {
    failing: Vec<Operation>,
    pausable: Option<bool>,
}

impl Scripted {
    fn failing(ops: &[Operation]) -> Self {
        Self {
            failing: ops.to_vec(),
            ..Self::default()
        }
    }

    fn run(&self, op: Operation) -> HandlerFuture<'_> {
        if self.failing.contains(&op) {
            let boom = std::io::Error::new(std::io::ErrorKind::Other, "boom");
            Box::pin(std::future::ready(Err(CoreError::handler(boom))))
        } else {
            succeed()
        }
    }
}

impl Handlers for Scripted {
    fn handle_initialization(&self) -> HandlerFuture<'_> {
        self.run(Operation::Initialize)
    }
    fn handle_finalization(&self) -> HandlerFuture<'_> {
        self.run(Operation::Finalize)
    }
    fn handle_connection(&self) -> HandlerFuture<'_> {
        self.run(Operation::Connect)
    }
    fn handle_disconnection(&self) -> HandlerFuture<'_> {
        self.run(Operation::Disconnect)
    }
    fn handle_load(&self) -> HandlerFuture<'_> {
        self.run(Operation::Load)
    }
    fn handle_unload(&self) -> HandlerFuture<'_> {
        self.run(Operation::Unload)
    }
    fn handle_start(&self) -> HandlerFuture<'_> {
        self.run(Operation::Start)
    }
    fn handle_stop(&self) -> HandlerFuture<'_> {
        self.run(Operation::Stop)
    }
    fn handle_pause(&self) -> HandlerFuture<'_> {
        self.run(Operation::Pause)
    }
    fn handle_resume(&self) -> HandlerFuture<'_> {
        self.run(Operation::Resume)
    }
    fn can_pause(&self) -> bool {
        self.pausable.unwrap_or(true)
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn record(component: &Component) -> Arc<Mutex<Vec<Event>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    component.subscribe(
        None,
        Arc::new(move |ev: &Event| sink.lock().unwrap().push(ev.clone())),
    );
    events
}

fn signals(events: &Arc<Mutex<Vec<Event>>>) -> Vec<Signal> {
    events.lock().unwrap().iter().map(|e| e.signal).collect()
}

fn states(events: &Arc<Mutex<Vec<Event>>>) -> Vec<State> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(Event::new_state)
        .collect()
}

fn full(name: &str, handlers: Scripted) -> Component {
    Component::builder(name)
        .layer(Layer::Connectable)
        .layer(Layer::Loadable)
        .layer(Layer::Runnable)
        .handlers(handlers)
        .build()
        .unwrap()
}

#[tokio::test]
async fn connect_emits_connecting_connected_ready_in_order() {
    let c = Component::builder("db").layer(Layer::Connectable).build().unwrap();
    c.initialize().await.unwrap();
    let events = record(&c);

    c.connect().await.unwrap();

    assert_eq!(c.state(), State::Ready);
    assert_eq!(
        signals(&events),
        vec![
            Signal::StateChanged,
            Signal::Connecting,
            Signal::StateChanged,
            Signal::Connected,
            Signal::Ready,
        ]
    );
    assert_eq!(states(&events), vec![State::Connecting, State::Ready]);
}

#[tokio::test]
async fn failed_connect_rolls_back_and_returns_the_handler_error() {
    init_tracing();
    let c = Component::builder("db")
        .layer(Layer::Connectable)
        .handlers(Scripted::failing(&[Operation::Connect]))
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    let events = record(&c);

    let err = c.connect().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerFailure);
    assert_eq!(err.message, "boom");
    assert_eq!(c.state(), State::Initialized);

    let events = events.lock().unwrap();
    let failure = events
        .iter()
        .find(|e| e.signal == Signal::ConnectionFailed)
        .expect("connectionFailed must be emitted");
    assert_eq!(failure.error(), Some(&err));
    assert!(!events.iter().any(|e| e.signal == Signal::Ready));
    assert_eq!(events.last().and_then(Event::new_state), Some(State::Initialized));
}

#[tokio::test]
async fn operations_round_trip() {
    let c = full("svc", Scripted::default());

    c.initialize().await.unwrap();
    assert_eq!(c.state(), State::Initialized);
    assert!(c.is_initialized());

    c.connect().await.unwrap();
    c.disconnect().await.unwrap();
    assert_eq!(c.state(), State::Initialized);

    c.load().await.unwrap();
    c.unload().await.unwrap();
    assert_eq!(c.state(), State::Initialized);

    c.connect().await.unwrap();
    c.start().await.unwrap();
    assert_eq!(c.state(), State::Running);
    c.stop().await.unwrap();
    assert_eq!(c.state(), State::Ready);

    c.disconnect().await.unwrap();
    c.finalize().await.unwrap();
    assert_eq!(c.state(), State::NotInitialized);
    assert!(!c.is_initialized());
}

#[tokio::test]
async fn every_failing_handler_restores_the_rollback_state() {
    init_tracing();
    let cases = [
        (Operation::Initialize, State::NotInitialized, Signal::InitializationFailed),
        (Operation::Connect, State::Initialized, Signal::ConnectionFailed),
        (Operation::Load, State::Initialized, Signal::LoadFailed),
        (Operation::Disconnect, State::Ready, Signal::DisconnectionFailed),
        (Operation::Unload, State::Ready, Signal::UnloadFailed),
        (Operation::Start, State::Ready, Signal::StartFailed),
        (Operation::Pause, State::Running, Signal::PauseFailed),
        (Operation::Resume, State::Paused, Signal::ResumeFailed),
        (Operation::Stop, State::Running, Signal::StopFailed),
        (Operation::Finalize, State::Initialized, Signal::FinalizationFailed),
    ];

    for (failing, expected, failure_signal) in cases {
        let c = full("svc", Scripted::failing(&[failing]));
        let path: &[Operation] = match failing {
            Operation::Initialize => &[],
            Operation::Connect | Operation::Load | Operation::Finalize => &[Operation::Initialize],
            Operation::Disconnect | Operation::Unload | Operation::Start => {
                &[Operation::Initialize, Operation::Connect]
            }
            Operation::Pause | Operation::Stop => {
                &[Operation::Initialize, Operation::Connect, Operation::Start]
            }
            Operation::Resume => &[
                Operation::Initialize,
                Operation::Connect,
                Operation::Start,
                Operation::Pause,
            ],
        };
        for op in path {
            c.transition(*op).await.unwrap();
        }
        assert_eq!(c.state(), expected, "setup for {failing}");
        let events = record(&c);

        let err = c.transition(failing).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::HandlerFailure, "{failing}");
        assert_eq!(c.state(), expected, "{failing} must roll back");
        assert!(signals(&events).contains(&failure_signal), "{failing}");
        assert!(!signals(&events).contains(&failing.success_signal()), "{failing}");
    }
}

#[tokio::test]
async fn guard_rejection_emits_failure_and_keeps_state() {
    let c = Component::builder("svc").layer(Layer::Runnable).build().unwrap();
    let events = record(&c);

    let err = c.start().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert_eq!(c.state(), State::NotInitialized);
    assert_eq!(signals(&events), vec![Signal::StartFailed]);
}

#[tokio::test]
async fn operations_of_missing_layers_are_not_permitted() {
    let c = Component::builder("svc").layer(Layer::Runnable).build().unwrap();
    c.initialize().await.unwrap();
    let events = record(&c);

    let err = c.connect().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotPermitted);
    assert_eq!(c.state(), State::Initialized);
    assert!(events.lock().unwrap().is_empty());
    assert!(c.connection_lost().is_err());
}

#[tokio::test]
async fn pause_and_resume_are_refused_when_pausing_is_disabled() {
    let handlers = Scripted {
        pausable: Some(false),
        ..Scripted::default()
    };
    let c = Component::builder("svc")
        .layer(Layer::Runnable)
        .handlers(handlers)
        .ready_on_initialize(true)
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.start().await.unwrap();

    assert_eq!(c.pause().await.unwrap_err().kind, ErrorKind::NotPermitted);
    assert_eq!(c.resume().await.unwrap_err().kind, ErrorKind::NotPermitted);
    assert_eq!(c.state(), State::Running);
    assert!(!c.available_operations().contains(&Operation::Pause));
}

#[tokio::test]
async fn repeated_pause_and_resume_are_no_ops() {
    let c = Component::builder("svc")
        .layer(Layer::Runnable)
        .handlers(Scripted::default())
        .ready_on_initialize(true)
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.start().await.unwrap();

    c.resume().await.unwrap();
    c.pause().await.unwrap();
    let events = record(&c);
    c.pause().await.unwrap();

    assert_eq!(c.state(), State::Paused);
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_second_transition_sees_the_transitional_state() {
    struct Slow {
        release: Arc<Notify>,
    }
    impl Handlers for Slow {
        fn handle_connection(&self) -> HandlerFuture<'_> {
            Box::pin(async move {
                self.release.notified().await;
                Ok(())
            })
        }
    }

    let release = Arc::new(Notify::new());
    let c = Arc::new(
        Component::builder("db")
            .layer(Layer::Connectable)
            .handlers(Slow {
                release: release.clone(),
            })
            .build()
            .unwrap(),
    );
    c.initialize().await.unwrap();

    let first = tokio::spawn({
        let c = c.clone();
        async move { c.connect().await }
    });
    while c.state() != State::Connecting {
        tokio::task::yield_now().await;
    }

    let err = c.connect().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidState);
    assert_eq!(c.state(), State::Connecting);

    release.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(c.state(), State::Ready);
}

#[tokio::test]
async fn finalize_from_ready_disconnects_first() {
    let c = Component::builder("db")
        .layer(Layer::Connectable)
        .handlers(Scripted::default())
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.connect().await.unwrap();
    let events = record(&c);

    c.finalize().await.unwrap();

    assert_eq!(c.state(), State::NotInitialized);
    let signals = signals(&events);
    let disconnected = signals.iter().position(|s| *s == Signal::Disconnected);
    let finalizing = signals.iter().position(|s| *s == Signal::Finalizing);
    assert!(disconnected.is_some() && disconnected < finalizing);
}

#[tokio::test]
async fn failed_inner_disconnect_aborts_finalize() {
    let c = Component::builder("db")
        .layer(Layer::Connectable)
        .handlers(Scripted::failing(&[Operation::Disconnect]))
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.connect().await.unwrap();

    let err = c.finalize().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerFailure);
    assert_eq!(c.state(), State::Ready);
    assert!(c.is_initialized());
}

#[tokio::test]
async fn finalize_from_ready_unloads_first() {
    let c = Component::builder("cache")
        .layer(Layer::Loadable)
        .handlers(Scripted::default())
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.load().await.unwrap();
    let events = record(&c);

    c.finalize().await.unwrap();

    assert_eq!(c.state(), State::NotInitialized);
    assert_eq!(
        signals(&events),
        vec![
            Signal::StateChanged,
            Signal::Unloading,
            Signal::StateChanged,
            Signal::Unloaded,
            Signal::StateChanged,
            Signal::Finalizing,
            Signal::StateChanged,
            Signal::FinalizationSucceeded,
        ]
    );
}

#[tokio::test]
async fn failed_inner_unload_aborts_finalize() {
    init_tracing();
    let c = Component::builder("cache")
        .layer(Layer::Loadable)
        .handlers(Scripted::failing(&[Operation::Unload]))
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    c.load().await.unwrap();
    let events = record(&c);

    let err = c.finalize().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::HandlerFailure);
    assert_eq!(c.state(), State::Ready);
    assert!(c.is_initialized());
    let signals = signals(&events);
    assert!(signals.contains(&Signal::UnloadFailed));
    assert!(!signals.contains(&Signal::Finalizing));
}

#[tokio::test]
async fn ready_on_initialize_moves_on_to_ready() {
    let c = Component::builder("svc")
        .layer(Layer::Runnable)
        .ready_on_initialize(true)
        .build()
        .unwrap();
    let events = record(&c);

    c.initialize().await.unwrap();

    assert_eq!(c.state(), State::Ready);
    let signals = signals(&events);
    assert_eq!(signals.last(), Some(&Signal::Ready));
    assert!(signals.contains(&Signal::InitializationSucceeded));
}

#[tokio::test]
async fn connection_lost_and_reconnected() {
    let c = Component::builder("db").layer(Layer::Connectable).build().unwrap();
    c.initialize().await.unwrap();
    assert_eq!(c.connection_lost().unwrap_err().kind, ErrorKind::InvalidState);

    c.connect().await.unwrap();
    let events = record(&c);

    c.connection_lost().unwrap();
    assert_eq!(c.state(), State::Initialized);
    c.reconnected().unwrap();
    assert_eq!(c.state(), State::Ready);

    assert_eq!(
        signals(&events),
        vec![
            Signal::StateChanged,
            Signal::ConnectionLost,
            Signal::StateChanged,
            Signal::Ready,
            Signal::Reconnected,
        ]
    );
}

#[tokio::test]
async fn run_reports_pass_through_finishing() {
    let c = Component::builder("job")
        .layer(Layer::Runnable)
        .ready_on_initialize(true)
        .build()
        .unwrap();
    c.initialize().await.unwrap();
    assert!(c.report_run_finished(None).is_err());

    c.start().await.unwrap();
    let events = record(&c);
    c.report_run_finished(Some("42 rows".into())).unwrap();

    assert_eq!(c.state(), State::Ready);
    assert_eq!(states(&events), vec![State::Finishing, State::Ready]);
    {
        let events = events.lock().unwrap();
        let finished = events.iter().find(|e| e.signal == Signal::Finished).unwrap();
        assert_eq!(finished.payload, EventPayload::Report(Some("42 rows".into())));
    }

    c.start().await.unwrap();
    c.pause().await.unwrap();
    c.report_run_failed(CoreError::handler_msg("disk full")).unwrap();
    let failed = events
        .lock()
        .unwrap()
        .iter()
        .find(|e| e.signal == Signal::FinishedWithError)
        .and_then(|e| e.error().cloned())
        .unwrap();
    assert_eq!(failed.message, "disk full");
    assert_eq!(c.state(), State::Ready);
}

#[tokio::test]
async fn overridden_guard_is_honoured() {
    struct NoStart;
    impl Handlers for NoStart {
        fn guard(&self, op: Operation, current: State) -> bool {
            op != Operation::Start && op.permits(current)
        }
    }

    let c = Component::builder("svc")
        .layer(Layer::Runnable)
        .handlers(NoStart)
        .ready_on_initialize(true)
        .build()
        .unwrap();
    c.initialize().await.unwrap();

    assert_eq!(c.start().await.unwrap_err().kind, ErrorKind::InvalidState);
    assert_eq!(c.state(), State::Ready);
}

#[tokio::test]
async fn available_operations_follow_the_state() {
    let c = full("svc", Scripted::default());
    assert_eq!(c.available_operations(), vec![Operation::Initialize]);

    c.initialize().await.unwrap();
    let ops = c.available_operations();
    assert!(ops.contains(&Operation::Connect));
    assert!(ops.contains(&Operation::Load));
    assert!(ops.contains(&Operation::Finalize));
    assert!(!ops.contains(&Operation::Start));
}

#[tokio::test]
async fn handler_failures_are_logged_through_the_injected_sink() {
    let sink = Arc::new(MemorySink::new());
    let c = Component::builder("db")
        .layer(Layer::Connectable)
        .handlers(Scripted::failing(&[Operation::Connect]))
        .logger(Logger::new(sink.clone()).of("db"))
        .build()
        .unwrap();
    c.initialize().await.unwrap();

    let _ = c.connect().await;

    assert!(sink.contains("[db][connect] HandlerFailure: boom"));
    assert!(sink
        .lines()
        .iter()
        .any(|(level, line)| *level == Level::Error && line.contains("boom")));
}
