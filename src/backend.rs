use std::sync::Arc;

use crate::appender::{FileAppender, LevelFilter, StdoutAppender};
use crate::config::{ChannelConfig, LoggerConfig};
use crate::record::Level;
use crate::sink::{Appender, Notifier};
use crate::slack::SlackApiNotifier;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Error type returned when assembling a backend from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("failed to open log file: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "email")]
    #[error("email notifier setup failed: {0}")]
    Email(String),
}

/// Multi-sink logging backend.
///
/// Fans each line out to every registered [`Appender`] on the caller's
/// thread, and duplicates error-level lines to every registered
/// [`Notifier`] via detached Tokio tasks. The backend is a plain value
/// handed to the logger by reference; there is no process-global instance,
/// so independent loggers (and tests) can each own their own.
pub struct Backend {
    threshold: Level,
    appenders: Vec<Box<dyn Appender>>,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl Backend {
    /// Create an empty backend that drops records below `threshold`.
    pub fn new(threshold: Level) -> Self {
        Backend {
            threshold,
            appenders: Vec::new(),
            notifiers: Vec::new(),
        }
    }

    pub fn with_appender(mut self, appender: Box<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }

    /// Assemble the self-configured backend: all-levels file, error-only
    /// file, stdout mirror, plus whichever notification appenders the
    /// configuration enables.
    ///
    /// **Returns**
    /// - `Ok(Backend)` ready to be shared behind an `Arc`.
    /// - `Err(..)` if a log file cannot be opened or a notifier rejects
    ///   its settings. Partial channel configuration never reaches this
    ///   point; it is gated away during config resolution.
    pub fn from_config(config: &LoggerConfig) -> Result<Self, BackendError> {
        let mut backend = Backend::new(config.level)
            .with_appender(Box::new(FileAppender::new(config.log_file())?))
            .with_appender(Box::new(LevelFilter::new(
                Level::Error,
                Box::new(FileAppender::new(config.error_log_file())?),
            )))
            .with_appender(Box::new(StdoutAppender));

        #[cfg(feature = "email")]
        if let ChannelConfig::Enabled(settings) = &config.email {
            let notifier =
                crate::email::EmailNotifier::new(settings, &config.app_name, &config.env)
                    .map_err(|e| BackendError::Email(e.to_string()))?;
            backend = backend.with_notifier(Arc::new(notifier));
        }

        if let ChannelConfig::Enabled(settings) = &config.slack {
            backend = backend.with_notifier(Arc::new(SlackApiNotifier::new(settings.clone())));
        }

        Ok(backend)
    }

    /// Write one serialized record.
    ///
    /// Appender writes happen synchronously, in registration order. When
    /// `level` is `error`, the line is additionally handed to every
    /// notifier as a detached task; delivery failures are reported to
    /// stderr and dropped.
    ///
    /// **Returns**
    /// - Join handles of the spawned notification deliveries, so tests can
    ///   await completion. Production callers drop them. Empty when the
    ///   record is below the threshold, not an error, or no Tokio runtime
    ///   is available (the delivery is then lost, which is within the
    ///   best-effort contract).
    pub fn log(&self, level: Level, line: &str) -> Vec<JoinHandle<()>> {
        if level < self.threshold {
            return Vec::new();
        }

        for appender in &self.appenders {
            appender.append(level, line);
        }

        if level < Level::Error || self.notifiers.is_empty() {
            return Vec::new();
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                eprintln!("no tokio runtime, dropping error notification");
                return Vec::new();
            }
        };

        self.notifiers
            .iter()
            .map(|notifier| {
                let notifier = Arc::clone(notifier);
                let line = line.to_string();
                handle.spawn(async move {
                    if let Err(e) = notifier.notify(&line).await {
                        eprintln!("error notification delivery failed: {}", e);
                    }
                })
            })
            .collect()
    }
}
