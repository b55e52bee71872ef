use std::sync::atomic::Ordering;

use statekit_core::error::{CoreError, Domain, ErrorKind, Result};
use statekit_core::lifecycle::{
    begin_guarded, finish, Admission, Event, EventPayload, Layer, Operation, Signal, State,
    TransitionAttempt,
};

use super::handlers::dispatch;
use super::Component;
use crate::error::log_core_error;

/// Async transition protocol.
///
/// guard -> transitional state + pre-signal -> handler -> target state + success
/// signal, or failure signal + rollback state.
impl Component {
    pub async fn initialize(&self) -> Result<()> {
        self.transition(Operation::Initialize).await?;
        if self.ready_on_initialize {
            self.set_state(State::Ready);
        }
        Ok(())
    }

    /// Finalize, first disconnecting and unloading a `Ready` component.
    pub async fn finalize(&self) -> Result<()> {
        if self.supports(Layer::Lifecycle) && self.state() == State::Ready {
            if self.supports(Layer::Connectable) {
                self.transition(Operation::Disconnect).await?;
            }
            if self.supports(Layer::Loadable) && self.state() == State::Ready {
                self.transition(Operation::Unload).await?;
            }
        }
        self.transition(Operation::Finalize).await
    }

    pub async fn connect(&self) -> Result<()> {
        self.transition(Operation::Connect).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.transition(Operation::Disconnect).await
    }

    pub async fn load(&self) -> Result<()> {
        self.transition(Operation::Load).await
    }

    pub async fn unload(&self) -> Result<()> {
        self.transition(Operation::Unload).await
    }

    pub async fn start(&self) -> Result<()> {
        self.transition(Operation::Start).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.transition(Operation::Stop).await
    }

    /// Pause a running component. Already paused (or pausing) is a no-op.
    pub async fn pause(&self) -> Result<()> {
        self.transition(Operation::Pause).await
    }

    /// Resume a paused component. Already running (or resuming) is a no-op.
    pub async fn resume(&self) -> Result<()> {
        self.transition(Operation::Resume).await
    }

    /// Run one guarded transition.
    pub async fn transition(&self, op: Operation) -> Result<()> {
        if !self.supports(op.layer()) {
            let err = CoreError::not_permitted(format!(
                "{op} is not supported: component does not compose the {} layer",
                op.layer().label()
            ));
            log_core_error(&self.logger, &err);
            return Err(err);
        }
        if matches!(op, Operation::Pause | Operation::Resume) && !self.handlers.can_pause() {
            let err = CoreError::not_permitted(format!("{op} is not permitted: pausing is disabled"));
            log_core_error(&self.logger, &err);
            return Err(err);
        }

        let attempt = match self.admit(op) {
            Ok(Some(attempt)) => attempt,
            Ok(None) => {
                self.logger
                    .debug(format_args!("[{op}] already settled in {}", self.state()));
                return Ok(());
            }
            Err(err) => {
                log_core_error(&self.logger, &err);
                self.emit(Event::failure(op.failure_signal(), err.clone()));
                return Err(err);
            }
        };

        self.announce_state(attempt.transitional, attempt.previous, false);
        self.emit(Event::bare(op.pre_signal()));

        match dispatch(self.handlers.as_ref(), op).await {
            Ok(()) => {
                self.complete(&attempt);
                Ok(())
            }
            Err(err) => {
                self.abort(&attempt, &err);
                Err(err)
            }
        }
    }

    /// Guard evaluation and the transitional write happen under one lock.
    fn admit(&self, op: Operation) -> Result<Option<TransitionAttempt>> {
        let mut state = self.state.lock();
        let current = *state;
        let guard = self.handlers.guard(op, current);
        match begin_guarded(current, op, guard)? {
            Admission::Proceed(attempt) => {
                *state = attempt.transitional;
                Ok(Some(attempt))
            }
            Admission::Settled => Ok(None),
        }
    }

    fn complete(&self, attempt: &TransitionAttempt) {
        let op = attempt.operation;
        let target = finish(attempt, true);

        match op {
            Operation::Initialize => self.initialized.store(true, Ordering::Release),
            Operation::Finalize => self.initialized.store(false, Ordering::Release),
            _ => {}
        }

        if let Some(previous) = self.write_state(target) {
            self.announce_state(target, previous, !op.announces_ready());
        }
        self.emit(Event::bare(op.success_signal()));
        if op.announces_ready() {
            self.emit(Event::bare(Signal::Ready));
        }
        self.logger.debug(format_args!("[{op}] succeeded -> {target}"));
    }

    fn abort(&self, attempt: &TransitionAttempt, err: &CoreError) {
        let op = attempt.operation;
        let rollback = finish(attempt, false);

        log_core_error(&self.logger.of(op.label()), err);
        self.emit(Event::failure(op.failure_signal(), err.clone()));
        self.set_state(rollback);
    }

    /// Report a lost connection: `Ready` -> `Initialized`, then `connectionLost`.
    pub fn connection_lost(&self) -> Result<()> {
        self.shift(Layer::Connectable, State::Ready, State::Initialized, "connection lost")?;
        self.emit(Event::bare(Signal::ConnectionLost));
        Ok(())
    }

    /// Report a restored connection: `Initialized` -> `Ready`, then `reconnected`.
    pub fn reconnected(&self) -> Result<()> {
        self.shift(Layer::Connectable, State::Initialized, State::Ready, "reconnected")?;
        self.emit(Event::bare(Signal::Reconnected));
        Ok(())
    }

    /// The run completed on its own: `Finishing`, `finished(summary)`, then `Ready`.
    pub fn report_run_finished(&self, summary: Option<String>) -> Result<()> {
        self.finish_run(Event::new(Signal::Finished, EventPayload::Report(summary)))
    }

    /// The run ended with an error: `Finishing`, `finishedWithError(error)`, then `Ready`.
    pub fn report_run_failed(&self, error: CoreError) -> Result<()> {
        log_core_error(&self.logger, &error);
        self.finish_run(Event::failure(Signal::FinishedWithError, error))
    }

    fn finish_run(&self, event: Event) -> Result<()> {
        let previous = {
            let mut state = self.state.lock();
            let current = *state;
            if !self.supports(Layer::Runnable) {
                return Err(CoreError::not_permitted(
                    "run reports need the runnable layer",
                ));
            }
            if !matches!(current, State::Running | State::Paused) {
                return Err(invalid_state(current, "run reports need a running or paused component"));
            }
            *state = State::Finishing;
            current
        };

        self.announce_state(State::Finishing, previous, false);
        self.emit(event);
        self.set_state(State::Ready);
        Ok(())
    }

    /// Checked, handler-free state change used by out-of-band reports.
    fn shift(&self, layer: Layer, from: State, to: State, what: &str) -> Result<()> {
        if !self.supports(layer) {
            return Err(CoreError::not_permitted(format!(
                "{what}: component does not compose the {} layer",
                layer.label()
            )));
        }
        {
            let mut state = self.state.lock();
            if *state != from {
                return Err(invalid_state(*state, &format!("{what} requires state {from}")));
            }
            *state = to;
        }
        self.announce_state(to, from, true);
        Ok(())
    }
}

fn invalid_state(current: State, message: &str) -> CoreError {
    CoreError::warn()
        .domain(Domain::Lifecycle)
        .kind(ErrorKind::InvalidState)
        .msgf(format_args!("{message}, current state is {current}"))
        .build()
}
