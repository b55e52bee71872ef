use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Convenient result alias for statekit_core.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Shared, clonable handle on an underlying failure.
pub type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Log/handling importance. Maps onto logging levels in the async crate.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// Where an error came from (helps triage and routing).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Domain {
    Lifecycle,
    Watcher,
    Waiter,
    Config,
    Logging,
    Other,
}

/// Stable error "kind" for matching/branching.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed options (empty watch list, blank state name, ...).
    InvalidArgument,
    /// A guard rejected the requested transition.
    InvalidState,
    /// The capability is disabled or not composed by the component.
    NotPermitted,
    /// A transition handler reported a failure.
    HandlerFailure,
    Timeout,
    Other,
}

/// Optional structured payload for rich context without forcing allocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Payload {
    None,

    /// Generic key/value context (usually no heap alloc if using &str).
    Context {
        key: &'static str,
        value: Cow<'static, str>,
    },

    /// Lifecycle-specific context.
    LifecycleTransition {
        from_state: u8,
        via_operation: u8,
    },

    /// Arbitrary numeric detail (e.g., error codes from external libs).
    Code(u32),
}

/// The one error type that crosses module boundaries in statekit.
///
/// Clonable so the same failure can be handed to failure-signal subscribers
/// and returned to the caller of the operation.
#[derive(Debug, Error, Clone)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub domain: Domain,
    pub kind: ErrorKind,
    pub severity: Severity,
    pub message: Cow<'static, str>,
    pub payload: Payload,
    #[source]
    pub cause: Option<Cause>,
}

impl PartialEq for CoreError {
    fn eq(&self, other: &Self) -> bool {
        self.domain == other.domain
            && self.kind == other.kind
            && self.severity == other.severity
            && self.message == other.message
            && self.payload == other.payload
    }
}

impl CoreError {
    /// Fully-specified constructor (rarely needed at call sites).
    pub fn new(
        domain: Domain,
        kind: ErrorKind,
        severity: Severity,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            domain,
            kind,
            severity,
            message: message.into(),
            payload: Payload::None,
            cause: None,
        }
    }

    // ---------------- Fluent entry points ----------------

    #[inline]
    pub fn info() -> ErrB {
        ErrB::new(Severity::Info)
    }
    #[inline]
    pub fn warn() -> ErrB {
        ErrB::new(Severity::Warn)
    }
    #[inline]
    pub fn error() -> ErrB {
        ErrB::new(Severity::Error)
    }

    /// A guard rejected `via_operation` while the component was in `from_state`.
    pub fn invalid_state_lifecycle(
        from_state: u8,
        via_operation: u8,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        CoreError::warn()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::InvalidState)
            .msg(message)
            .payload(Payload::LifecycleTransition {
                from_state,
                via_operation,
            })
            .build()
    }

    /// Operation refused because the capability is disabled.
    pub fn not_permitted(message: impl Into<Cow<'static, str>>) -> Self {
        CoreError::warn()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::NotPermitted)
            .msg(message)
            .build()
    }

    /// Malformed input in the given domain.
    pub fn invalid_argument(domain: Domain, message: impl Into<Cow<'static, str>>) -> Self {
        CoreError::warn()
            .domain(domain)
            .kind(ErrorKind::InvalidArgument)
            .msg(message)
            .build()
    }

    /// Wrap a handler's own failure, keeping it reachable through `source()`.
    pub fn handler<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::error()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::HandlerFailure)
            .msg(cause.to_string())
            .cause(Arc::new(cause))
            .build()
    }

    /// Handler failure described only by a message.
    pub fn handler_msg(message: impl Into<Cow<'static, str>>) -> Self {
        CoreError::error()
            .domain(Domain::Lifecycle)
            .kind(ErrorKind::HandlerFailure)
            .msg(message)
            .build()
    }
}

/// Fluent builder that behaves like iterator chains (takes self, returns Self).
/// Defaults:
/// - domain = Other
/// - kind = Other
/// - message = ""
/// - payload = None
/// - cause = None
#[derive(Debug, Clone)]
pub struct ErrB {
    domain: Domain,
    kind: ErrorKind,
    severity: Severity,
    message: Cow<'static, str>,
    payload: Payload,
    cause: Option<Cause>,
}

impl ErrB {
    #[inline]
    fn new(severity: Severity) -> Self {
        Self {
            domain: Domain::Other,
            kind: ErrorKind::Other,
            severity,
            message: Cow::Borrowed(""),
            payload: Payload::None,
            cause: None,
        }
    }

    // -------- Guided setters --------

    /// Set/override the domain (defaults to Domain::Other).
    #[inline]
    pub fn domain(mut self, d: Domain) -> Self {
        self.domain = d;
        self
    }

    /// Set/override the kind (defaults to ErrorKind::Other).
    #[inline]
    pub fn kind(mut self, k: ErrorKind) -> Self {
        self.kind = k;
        self
    }

    /// Set/override the message (defaults to "").
    #[inline]
    pub fn msg(mut self, m: impl Into<Cow<'static, str>>) -> Self {
        self.message = m.into();
        self
    }

    /// Formatting-friendly message setter.
    #[inline]
    pub fn msgf(mut self, args: fmt::Arguments<'_>) -> Self {
        self.message = Cow::Owned(args.to_string());
        self
    }

    /// Only one payload: this replaces any previous payload (default is None).
    #[inline]
    pub fn payload(mut self, p: Payload) -> Self {
        self.payload = p;
        self
    }

    /// Attach the underlying failure.
    #[inline]
    pub fn cause(mut self, c: Cause) -> Self {
        self.cause = Some(c);
        self
    }

    // -------- Finish --------
    #[inline]
    pub fn build(self) -> CoreError {
        CoreError {
            domain: self.domain,
            kind: self.kind,
            severity: self.severity,
            message: self.message,
            payload: self.payload,
            cause: self.cause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn builder_defaults_to_other() {
        let e = CoreError::info().msg("hello").build();
        assert_eq!(e.domain, Domain::Other);
        assert_eq!(e.kind, ErrorKind::Other);
        assert_eq!(e.severity, Severity::Info);
        assert_eq!(e.payload, Payload::None);
        assert!(e.cause.is_none());
    }

    #[test]
    fn handler_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let e = CoreError::handler(io);

        assert_eq!(e.kind, ErrorKind::HandlerFailure);
        assert_eq!(e.message, "boom");
        let source = e.source().expect("cause must be exposed as source");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn display_includes_kind_and_message() {
        let e = CoreError::not_permitted("pause is not permitted");
        assert_eq!(e.to_string(), "NotPermitted: pause is not permitted");
    }
}
