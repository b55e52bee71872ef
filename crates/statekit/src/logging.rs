//! Logging façade.
//!
//! Components log through a [`Logger`]: a list of prefixes in front of an injectable
//! [`LogSink`]. When nothing is injected the sink is resolved by name from a
//! process-wide registry, falling back to the unnamed default and finally to
//! [`TracingSink`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

/// Log levels understood by every sink.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Destination of log lines.
pub trait LogSink: Send + Sync + 'static {
    fn log(&self, level: Level, message: &str);

    fn is_enabled(&self, _level: Level) -> bool {
        true
    }
}

/// Default sink: forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Trace => tracing::trace!("{message}"),
            Level::Debug => tracing::debug!("{message}"),
            Level::Info => tracing::info!("{message}"),
            Level::Warn => tracing::warn!("{message}"),
            Level::Error => tracing::error!("{message}"),
        }
    }

    fn is_enabled(&self, level: Level) -> bool {
        match level {
            Level::Trace => tracing::enabled!(tracing::Level::TRACE),
            Level::Debug => tracing::enabled!(tracing::Level::DEBUG),
            Level::Info => tracing::enabled!(tracing::Level::INFO),
            Level::Warn => tracing::enabled!(tracing::Level::WARN),
            Level::Error => tracing::enabled!(tracing::Level::ERROR),
        }
    }
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _message: &str) {}

    fn is_enabled(&self, _level: Level) -> bool {
        false
    }
}

// ---------------- Process-wide defaults ----------------

const DEFAULT_NAME: &str = "";

fn registry() -> &'static RwLock<HashMap<String, Arc<dyn LogSink>>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Arc<dyn LogSink>>>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register `sink` as the default for `name` (`None` sets the unnamed default).
pub fn set_default_logger(name: Option<&str>, sink: Arc<dyn LogSink>) {
    let key = name.unwrap_or(DEFAULT_NAME).to_string();
    registry().write().insert(key, sink);
}

/// Remove a registered default. Returns whether one was registered.
pub fn clear_default_logger(name: Option<&str>) -> bool {
    registry().write().remove(name.unwrap_or(DEFAULT_NAME)).is_some()
}

/// Resolve the sink for `name`: named default, then unnamed default, then tracing.
pub fn default_logger(name: Option<&str>) -> Arc<dyn LogSink> {
    let sinks = registry().read();
    let resolved = name
        .and_then(|n| sinks.get(n))
        .or_else(|| sinks.get(DEFAULT_NAME))
        .cloned();
    resolved.unwrap_or_else(|| Arc::new(TracingSink) as Arc<dyn LogSink>)
}

/// Names that currently have a registered default (unnamed default excluded).
pub fn registered_loggers() -> Vec<String> {
    let mut names: Vec<String> = registry()
        .read()
        .keys()
        .filter(|k| !k.is_empty())
        .cloned()
        .collect();
    names.sort();
    names
}

// ---------------- Logger ----------------

/// Prefixing proxy in front of a sink.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<dyn LogSink>,
    prefixes: Vec<String>,
    prefix: String,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Logger with an explicit sink and no prefix.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_prefixes(sink, Vec::new())
    }

    /// Logger prefixed with `[name]`, writing to the default sink resolved for `name`.
    pub fn named(name: &str) -> Self {
        Self::with_prefixes(default_logger(Some(name)), vec![name.to_string()])
    }

    fn with_prefixes(sink: Arc<dyn LogSink>, prefixes: Vec<String>) -> Self {
        let prefixes: Vec<String> = prefixes.into_iter().filter(|p| !p.is_empty()).collect();
        let prefix = prefixes.iter().map(|p| format!("[{p}]")).collect();
        Self {
            sink,
            prefixes,
            prefix,
        }
    }

    /// Child logger sharing the sink, with one more prefix.
    pub fn of(&self, prefix: &str) -> Self {
        let mut prefixes = self.prefixes.clone();
        prefixes.push(prefix.to_string());
        Self::with_prefixes(Arc::clone(&self.sink), prefixes)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.sink.is_enabled(level)
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.sink.is_enabled(level) {
            return;
        }
        let message = args.to_string();
        let line = if self.prefix.is_empty() {
            message
        } else if message.starts_with('[') {
            format!("{}{message}", self.prefix)
        } else {
            format!("{} {message}", self.prefix)
        };
        self.sink.log(level, &line);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }
}

/// In-memory sink, handy for asserting on diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: parking_lot::Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.lock().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|(_, l)| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}
