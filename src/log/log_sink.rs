use crate::log::LogLevel;

/// Defines a destination (sink) for engine log messages.
///
/// The engine never writes output itself; every message goes through the
/// sink the session was created with. Implementations must be `Send` and
/// `Sync` so one sink can serve sessions on different threads.
pub trait LogSink: Send + Sync {
    /// Records a log message.
    ///
    /// # Arguments
    ///
    /// * `level` - The severity level of the log message.
    /// * `msg` - The content of the log message.
    /// * `target` - The static source of the log (e.g., module path).
    fn log(&self, level: LogLevel, msg: &str, target: &'static str);
}
