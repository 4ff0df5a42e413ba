use crate::record::Level;
use async_trait::async_trait;
use std::error::Error;

/// Synchronous destination for serialized log lines.
///
/// Implementations write one JSON line per call (file, stdout, in-memory
/// capture). The backend calls `append` on the caller's thread, so
/// implementations must be cheap and must never panic; a write failure is
/// the appender's own concern (report to stderr and drop).
pub trait Appender: Send + Sync {
    /// Write a single serialized record.
    ///
    /// **Parameters**
    /// - `level`: severity of the record, for level-filtering wrappers.
    /// - `line`: the record serialized as one JSON object, no trailing
    ///   newline.
    fn append(&self, level: Level, line: &str);
}

/// Asynchronous best-effort destination for notification deliveries.
///
/// Implementations transport a serialized record to an external channel
/// (SMTP, Slack API, incoming webhook). The backend calls `notify` from a
/// detached Tokio task and never awaits it on the application thread.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a single message to the underlying channel.
    ///
    /// **Returns**
    /// - `Ok(())` if the channel accepted the message.
    /// - `Err(..)` on transport failure (network error, HTTP status,
    ///   rejected recipient, etc.). The delivery task logs the error and
    ///   drops it; there is no retry and no propagation to the original
    ///   logging call.
    async fn notify(&self, message: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}
