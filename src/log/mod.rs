pub mod log_macros;
pub mod log_sink;

pub use log_sink::LogSink;

/// Severity of an engine log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Per-packet detail: protect/unprotect outcomes, indices, lengths.
    Trace,
    /// Key-schedule and stream-lifecycle detail.
    Debug,
    /// Coarse progress messages.
    Info,
    /// Suspicious but survivable conditions (replays, SSRC collisions).
    Warn,
    /// Failures the caller will also see as an error status.
    Error,
}

/// Sink that discards every message; sessions created without an explicit
/// logger use this.
#[derive(Debug, Clone, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn log(&self, _level: LogLevel, _msg: &str, _target: &'static str) {}
}
