//! Output filter for the host logging sink.
//!
//! [`FilteredConsole`] decorates any [`LogSink`]: every string argument is run
//! through the console redaction pipeline before being forwarded, structured
//! arguments pass through untouched, and no call is ever dropped.
//!
//! [`TracingSink`] is the default underlying sink for Rust hosts; it forwards
//! each call to the matching `tracing` macro.

use std::fmt;

use crate::patterns::Redactor;

/// Severity methods exposed by the logging sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Log,
    Warn,
    Error,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Log,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];
}

/// One argument to a logging call.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Str(String),
    /// Structured value; never inspected by the filter.
    Value(serde_json::Value),
}

impl From<&str> for LogArg {
    fn from(s: &str) -> Self {
        LogArg::Str(s.to_string())
    }
}

impl From<String> for LogArg {
    fn from(s: String) -> Self {
        LogArg::Str(s)
    }
}

impl From<serde_json::Value> for LogArg {
    fn from(v: serde_json::Value) -> Self {
        LogArg::Value(v)
    }
}

impl fmt::Display for LogArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogArg::Str(s) => f.write_str(s),
            LogArg::Value(v) => write!(f, "{}", v),
        }
    }
}

/// A logging sink with multiple severity methods.
pub trait LogSink: Send + Sync {
    fn emit(&self, level: LogLevel, args: &[LogArg]);

    fn log(&self, message: &str) {
        self.emit(LogLevel::Log, &[LogArg::from(message)]);
    }

    fn warn(&self, message: &str) {
        self.emit(LogLevel::Warn, &[LogArg::from(message)]);
    }

    fn error(&self, message: &str) {
        self.emit(LogLevel::Error, &[LogArg::from(message)]);
    }
}

/// Forwards to `tracing`, joining arguments with spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, level: LogLevel, args: &[LogArg]) {
        let line = args
            .iter()
            .map(|a| a.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        match level {
            LogLevel::Log | LogLevel::Info => {
                tracing::info!(target: "docshield::console", "{}", line)
            }
            LogLevel::Warn => tracing::warn!(target: "docshield::console", "{}", line),
            LogLevel::Error => tracing::error!(target: "docshield::console", "{}", line),
            LogLevel::Debug => tracing::debug!(target: "docshield::console", "{}", line),
            LogLevel::Trace => tracing::trace!(target: "docshield::console", "{}", line),
        }
    }
}

/// Scrubs string arguments before delegating to the captured sink.
pub struct FilteredConsole<S> {
    inner: S,
    redactor: Redactor,
}

impl<S: LogSink> FilteredConsole<S> {
    pub fn new(inner: S, redactor: Redactor) -> Self {
        Self { inner, redactor }
    }

    pub fn filter_args(&self, args: &[LogArg]) -> Vec<LogArg> {
        args.iter()
            .map(|arg| match arg {
                LogArg::Str(s) => LogArg::Str(self.redactor.console(s)),
                other => other.clone(),
            })
            .collect()
    }
}

impl<S: LogSink> LogSink for FilteredConsole<S> {
    fn emit(&self, level: LogLevel, args: &[LogArg]) {
        let filtered = self.filter_args(args);
        self.inner.emit(level, &filtered);
    }
}
