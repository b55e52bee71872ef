use std::future::Future;
use std::pin::Pin;

use statekit_core::error::Result;
use statekit_core::lifecycle::{Operation, State};

/// Boxed handler future. Resolves exactly once: `Ok` for success, `Err` for failure.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Immediately successful handler future.
pub fn succeed<'a>() -> HandlerFuture<'a> {
    Box::pin(std::future::ready(Ok(())))
}

/// Extension points of a component.
///
/// Every handler defaults to immediate success; override the ones the component
/// needs. Handlers take `&self` and run while the component sits in the
/// transitional state, so implementors keep mutable data behind their own locks.
pub trait Handlers: Send + Sync + 'static {
    fn handle_initialization(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_finalization(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_connection(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_disconnection(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_load(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_unload(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_start(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_stop(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_pause(&self) -> HandlerFuture<'_> {
        succeed()
    }

    fn handle_resume(&self) -> HandlerFuture<'_> {
        succeed()
    }

    /// When false, pause and resume are refused regardless of state.
    fn can_pause(&self) -> bool {
        true
    }

    /// Guard predicate for `op`. Defaults to the operation table.
    fn guard(&self, op: Operation, current: State) -> bool {
        op.permits(current)
    }
}

/// Handlers that accept every transition.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

impl Handlers for NoopHandlers {}

pub(crate) fn dispatch(handlers: &dyn Handlers, op: Operation) -> HandlerFuture<'_> {
    match op {
        Operation::Initialize => handlers.handle_initialization(),
        Operation::Finalize => handlers.handle_finalization(),
        Operation::Connect => handlers.handle_connection(),
        Operation::Disconnect => handlers.handle_disconnection(),
        Operation::Load => handlers.handle_load(),
        Operation::Unload => handlers.handle_unload(),
        Operation::Start => handlers.handle_start(),
        Operation::Stop => handlers.handle_stop(),
        Operation::Pause => handlers.handle_pause(),
        Operation::Resume => handlers.handle_resume(),
    }
}
