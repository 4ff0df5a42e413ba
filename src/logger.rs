use crate::backend::{Backend, BackendError};
use crate::config::{self, ChannelConfig, LoggerConfig, RawSettings};
use crate::record::{build_record, FixedFields, Level};
use crate::webhook::WebhookClient;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Structured application logger.
///
/// Owns the fixed metadata (host, source, env, ver) captured at
/// construction and a handle to a [`Backend`]. Every call builds a fresh
/// JSON record, writes it through the backend, and — for
/// [`Logger::info_important`] — forwards the serialized line to the
/// incoming-webhook side channel, fire-and-forget.
///
/// `info`/`warn`/`error` never return an error and never panic; transport
/// and write failures stay inside the backend and the detached delivery
/// tasks.
#[derive(Clone)]
pub struct Logger {
    fixed: FixedFields,
    backend: Arc<Backend>,
    webhook: Option<WebhookClient>,
}

impl Logger {
    /// Self-configuring constructor: resolve settings from the process
    /// environment, assemble the backend (all-levels file, error-only
    /// file, stdout, enabled notification appenders), and emit the
    /// startup records.
    pub fn from_env(app_name: &str) -> Result<Self, BackendError> {
        Self::from_settings(app_name, RawSettings::from_env())
    }

    /// Same as [`Logger::from_env`] but driven from explicit settings.
    /// This is the seam used by tests and by applications that load
    /// configuration themselves.
    pub fn from_settings(app_name: &str, raw: RawSettings) -> Result<Self, BackendError> {
        let config = LoggerConfig::resolve(app_name, raw);
        let backend = Backend::from_config(&config)?;

        let webhook = config
            .webhook
            .enabled()
            .map(|settings| WebhookClient::new(settings.url.clone()));

        let logger = Logger {
            fixed: FixedFields {
                host: config.hostname.clone(),
                source: config.app_name.clone(),
                env: config.env.clone(),
                ver: config.ver.clone(),
            },
            backend: Arc::new(backend),
            webhook,
        };

        logger.log_startup(&config);
        Ok(logger)
    }

    /// Externally-injected backend constructor. Emits no startup records;
    /// the caller owns the backend wiring. `env` and `ver` still come from
    /// the process environment with the usual `unknown` fallback.
    pub fn with_backend(app_name: &str, backend: Arc<Backend>) -> Self {
        Logger {
            fixed: FixedFields {
                host: config::hostname(),
                source: app_name.to_string(),
                env: std::env::var(config::ENV_ENV)
                    .unwrap_or_else(|_| config::UNKNOWN.to_string()),
                ver: std::env::var(config::VER_ENV)
                    .unwrap_or_else(|_| config::UNKNOWN.to_string()),
            },
            backend,
            webhook: None,
        }
    }

    /// Attach the incoming-webhook side channel used by
    /// [`Logger::info_important`].
    pub fn with_webhook(mut self, url: impl Into<String>) -> Self {
        self.webhook = Some(WebhookClient::new(url.into()));
        self
    }

    /// Log an info-level event.
    pub fn info(&self, event_name: &str, event_data: Value) {
        self.emit(Level::Info, event_name, &event_data);
    }

    /// Log an info-level event and forward it to the webhook side
    /// channel.
    ///
    /// **Returns**
    /// - The join handle of the detached delivery task, so tests can
    ///   await it; production callers drop it.
    /// - `None` when no webhook is configured (zero POST attempts) or no
    ///   Tokio runtime is available.
    pub fn info_important(&self, event_name: &str, event_data: Value) -> Option<JoinHandle<()>> {
        let line = self.emit(Level::Info, event_name, &event_data);
        self.notify(line)
    }

    /// Log a warn-level event. Warnings never reach the webhook side
    /// channel; only `info_important` does. This asymmetry is inherited
    /// behavior, kept deliberately.
    pub fn warn(&self, event_name: &str, event_data: Value) {
        self.emit(Level::Warn, event_name, &event_data);
    }

    /// Log an error-level event. The backend duplicates error-level
    /// records to every configured notification appender (email, Slack
    /// API), independent of the webhook side channel.
    pub fn error(&self, event_name: &str, event_data: Value) {
        self.emit(Level::Error, event_name, &event_data);
    }

    /// Fire-and-forget webhook delivery of `message`.
    ///
    /// On failure the detached task emits exactly one `warn` record with
    /// event name `sendMessageToSlackError` carrying the error string.
    /// `warn` never triggers another notification attempt, so the failure
    /// path cannot recurse.
    pub fn notify(&self, message: impl Into<String>) -> Option<JoinHandle<()>> {
        let webhook = self.webhook.clone()?;
        let handle = Handle::try_current().ok()?;

        let backend = Arc::clone(&self.backend);
        let fixed = self.fixed.clone();
        let message = message.into();

        Some(handle.spawn(async move {
            if let Err(e) = webhook.post(&message).await {
                let record = build_record(
                    &fixed,
                    "sendMessageToSlackError",
                    &json!({ "error": e.to_string() }),
                    Level::Warn,
                );
                let _ = backend.log(Level::Warn, &Value::Object(record).to_string());
            }
        }))
    }

    fn emit(&self, level: Level, event_name: &str, event_data: &Value) -> String {
        let record = build_record(&self.fixed, event_name, event_data, level);
        let line = Value::Object(record).to_string();
        let _ = self.backend.log(level, &line);
        line
    }

    /// Startup records for the self-configuring constructors: one
    /// initialization summary, then one configured/not-configured record
    /// per optional notification channel. Secret values never appear;
    /// not-configured warnings only name the missing variables.
    fn log_startup(&self, config: &LoggerConfig) {
        self.info(
            "loggerInitialized",
            json!({
                "logDir": config.log_dir.display().to_string(),
                "logFile": config.log_file().display().to_string(),
                "errorLogFile": config.error_log_file().display().to_string(),
                "level": config.level.as_str(),
            }),
        );

        match &config.email {
            ChannelConfig::Enabled(email) => self.info(
                "emailConfigured",
                json!({
                    "emailService": email.service,
                    "emailUsername": email.username,
                    "emailSender": email.sender,
                    "emailRecipients": email.recipients,
                }),
            ),
            ChannelConfig::Disabled { missing } => {
                self.warn("emailNotConfigured", json!({ "missing": missing }))
            }
        }

        match &config.slack {
            ChannelConfig::Enabled(slack) => self.info(
                "slackConfigured",
                json!({
                    "slackChannelId": slack.channel_id,
                    "slackUsername": slack.username,
                }),
            ),
            ChannelConfig::Disabled { missing } => {
                self.warn("slackNotConfigured", json!({ "missing": missing }))
            }
        }

        match &config.webhook {
            // The webhook URL embeds a secret, so it is not echoed back.
            ChannelConfig::Enabled(_) => self.info("slackWebhookConfigured", json!({})),
            ChannelConfig::Disabled { missing } => {
                self.warn("slackWebhookNotConfigured", json!({ "missing": missing }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appender::MemoryAppender;
    use serde_json::json;

    fn capturing_logger(app_name: &str) -> (Logger, MemoryAppender) {
        let capture = MemoryAppender::new();
        let backend = Backend::new(Level::Info).with_appender(Box::new(capture.clone()));
        (Logger::with_backend(app_name, Arc::new(backend)), capture)
    }

    fn parse(line: &str) -> Value {
        serde_json::from_str(line).expect("emitted line is valid JSON")
    }

    #[test]
    fn records_carry_event_data_and_fixed_metadata() {
        let (logger, capture) = capturing_logger("svc");
        logger.warn("diskFull", json!({"pct": 97}));

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Warn);

        let record = parse(&lines[0].1);
        assert_eq!(record["logLevel"], "warn");
        assert_eq!(record["eventName"], "diskFull");
        assert_eq!(record["pct"], 97);
        assert_eq!(record["source"], "svc");
        assert!(record["host"].is_string());
        assert!(record["time"].is_string());
    }

    #[test]
    fn event_data_cannot_spoof_fixed_metadata() {
        let (logger, capture) = capturing_logger("svc");
        logger.info("spoof", json!({"source": "evil", "logLevel": "error"}));

        let record = parse(&capture.lines()[0].1);
        assert_eq!(record["source"], "svc");
        assert_eq!(record["logLevel"], "info");
    }

    #[tokio::test]
    async fn info_important_without_webhook_makes_zero_attempts() {
        let (logger, capture) = capturing_logger("svc");
        assert!(logger.info_important("deploy", json!({})).is_none());

        // The record itself is still written normally.
        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(parse(&lines[0].1)["eventName"], "deploy");
    }

    #[test]
    fn notify_without_runtime_returns_none() {
        let (logger, _capture) = capturing_logger("svc");
        let logger = logger.with_webhook("http://127.0.0.1:1/hook");
        assert!(logger.notify("message").is_none());
    }

    #[test]
    fn error_calls_do_not_touch_the_webhook() {
        // Inherited asymmetry: only info_important reaches the webhook.
        let (logger, capture) = capturing_logger("svc");
        let logger = logger.with_webhook("http://127.0.0.1:1/hook");
        logger.error("kaboom", json!({}));

        assert_eq!(capture.lines().len(), 1);
    }
}
