use statekit_core::error::{CoreError, Severity};

use crate::logging::{Level, Logger};

/// Map an error's severity onto a log level.
pub fn level_for(severity: Severity) -> Level {
    match severity {
        Severity::Trace => Level::Trace,
        Severity::Debug => Level::Debug,
        Severity::Info => Level::Info,
        Severity::Warn => Level::Warn,
        Severity::Error | Severity::Fatal => Level::Error,
    }
}

pub fn log_core_error(logger: &Logger, err: &CoreError) {
    logger.log(level_for(err.severity), format_args!("{err}"));
}
