use crate::record::Level;
use std::path::PathBuf;

/// Environment variable names recognized by the self-configuring
/// constructors.
///
/// These are purely helpers; the core logger types remain decoupled from
/// environment access and can be driven from an explicit [`RawSettings`].

/// Deployment environment tag, e.g. `production`. Defaults to `unknown`.
pub const ENV_ENV: &str = "ENV";

/// Application version tag. Defaults to `unknown`.
pub const VER_ENV: &str = "VER";

/// Minimum level written to the sinks. Defaults to `info`.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Directory holding the log files. Defaults to `./storage/logs`.
pub const LOG_DIR_ENV: &str = "LOG_DIR";

/// SMTP relay host used by the email notification appender.
pub const EMAIL_SERVICE_ENV: &str = "EMAIL_SERVICE";

/// SMTP auth user name.
pub const EMAIL_USERNAME_ENV: &str = "EMAIL_USERNAME";

/// SMTP auth password.
pub const EMAIL_PASSWORD_ENV: &str = "EMAIL_PASSWORD";

/// Sender address for error mails.
pub const EMAIL_SENDER_ENV: &str = "EMAIL_SENDER";

/// Comma-separated recipient addresses for error mails.
pub const EMAIL_RECIPIENTS_ENV: &str = "EMAIL_RECIPIENTS";

/// Slack API bot token for the `chat.postMessage` appender.
pub const SLACK_TOKEN_ENV: &str = "SLACK_TOKEN";

/// Slack channel id the API appender posts into.
pub const SLACK_CHANNEL_ID_ENV: &str = "SLACK_CHANNEL_ID";

/// Slack incoming-webhook URL for the `important` side channel.
pub const SLACK_WEBHOOK_URL_ENV: &str = "SLACK_WEBHOOK_URL";

/// Fallback for unset `env`/`ver` tags.
pub const UNKNOWN: &str = "unknown";

/// Default directory for the two log files.
pub const DEFAULT_LOG_DIR: &str = "./storage/logs";

/// Resolve the machine hostname once. Never fails; a hostname that is not
/// valid UTF-8 is replaced lossily.
pub fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

/// Raw optional settings, one per recognized environment variable.
///
/// [`RawSettings::from_env`] reads the process environment;
/// tests (and embedding applications) can fill the struct directly and skip
/// the environment entirely.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub env: Option<String>,
    pub ver: Option<String>,
    pub level: Option<String>,
    pub log_dir: Option<String>,
    pub email_service: Option<String>,
    pub email_username: Option<String>,
    pub email_password: Option<String>,
    pub email_sender: Option<String>,
    pub email_recipients: Option<String>,
    pub slack_token: Option<String>,
    pub slack_channel_id: Option<String>,
    pub slack_webhook_url: Option<String>,
}

impl RawSettings {
    /// Snapshot the recognized variables from the process environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        RawSettings {
            env: var(ENV_ENV),
            ver: var(VER_ENV),
            level: var(LOG_LEVEL_ENV),
            log_dir: var(LOG_DIR_ENV),
            email_service: var(EMAIL_SERVICE_ENV),
            email_username: var(EMAIL_USERNAME_ENV),
            email_password: var(EMAIL_PASSWORD_ENV),
            email_sender: var(EMAIL_SENDER_ENV),
            email_recipients: var(EMAIL_RECIPIENTS_ENV),
            slack_token: var(SLACK_TOKEN_ENV),
            slack_channel_id: var(SLACK_CHANNEL_ID_ENV),
            slack_webhook_url: var(SLACK_WEBHOOK_URL_ENV),
        }
    }
}

/// Gate for one optional notification channel.
///
/// A channel is enabled if and only if every one of its required fields is
/// present; partial configuration is identical to absence and is never an
/// error. `missing` carries the names of the absent variables so the
/// construction-time warning can enumerate them without touching any value.
#[derive(Debug, Clone)]
pub enum ChannelConfig<T> {
    Enabled(T),
    Disabled { missing: Vec<&'static str> },
}

impl<T> ChannelConfig<T> {
    pub fn enabled(&self) -> Option<&T> {
        match self {
            ChannelConfig::Enabled(settings) => Some(settings),
            ChannelConfig::Disabled { .. } => None,
        }
    }
}

/// Settings for the email notification appender. All five fields required.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    /// SMTP relay host, e.g. `smtp.gmail.com`.
    pub service: String,
    pub username: String,
    pub password: String,
    pub sender: String,
    /// Parsed from the comma-separated `EMAIL_RECIPIENTS` value.
    pub recipients: Vec<String>,
}

/// Settings for the Slack API (`chat.postMessage`) notification appender.
#[derive(Debug, Clone)]
pub struct SlackApiSettings {
    pub token: String,
    pub channel_id: String,
    /// Display name for posted messages; defaults to the application name.
    pub username: String,
}

/// Settings for the incoming-webhook side channel.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub url: String,
}

/// Immutable logger configuration, resolved once at construction.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub app_name: String,
    pub env: String,
    pub ver: String,
    pub hostname: String,
    pub level: Level,
    pub log_dir: PathBuf,
    pub email: ChannelConfig<EmailSettings>,
    pub slack: ChannelConfig<SlackApiSettings>,
    pub webhook: ChannelConfig<WebhookSettings>,
}

impl LoggerConfig {
    /// Resolve a configuration from the process environment.
    pub fn from_env(app_name: &str) -> Self {
        Self::resolve(app_name, RawSettings::from_env())
    }

    /// Resolve a configuration from explicit raw settings.
    ///
    /// An unparseable `level` falls back to `info` rather than failing;
    /// the logger must come up even when misconfigured.
    pub fn resolve(app_name: &str, raw: RawSettings) -> Self {
        let level = raw
            .level
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::Info);

        LoggerConfig {
            app_name: app_name.to_string(),
            env: raw.env.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            ver: raw.ver.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            hostname: hostname(),
            level,
            log_dir: PathBuf::from(raw.log_dir.clone().unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
            email: probe_email(&raw),
            slack: probe_slack(app_name, &raw),
            webhook: probe_webhook(&raw),
        }
    }

    /// Path of the all-levels log file, `<log_dir>/<app>.log`.
    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join(format!("{}.log", self.app_name))
    }

    /// Path of the error-only log file, `<log_dir>/<app>Error.log`.
    pub fn error_log_file(&self) -> PathBuf {
        self.log_dir.join(format!("{}Error.log", self.app_name))
    }
}

fn probe_email(raw: &RawSettings) -> ChannelConfig<EmailSettings> {
    let mut missing = Vec::new();
    if raw.email_service.is_none() {
        missing.push(EMAIL_SERVICE_ENV);
    }
    if raw.email_username.is_none() {
        missing.push(EMAIL_USERNAME_ENV);
    }
    if raw.email_password.is_none() {
        missing.push(EMAIL_PASSWORD_ENV);
    }
    if raw.email_sender.is_none() {
        missing.push(EMAIL_SENDER_ENV);
    }
    if raw.email_recipients.is_none() {
        missing.push(EMAIL_RECIPIENTS_ENV);
    }

    if !missing.is_empty() {
        return ChannelConfig::Disabled { missing };
    }

    let recipients = raw
        .email_recipients
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    ChannelConfig::Enabled(EmailSettings {
        service: raw.email_service.clone().unwrap_or_default(),
        username: raw.email_username.clone().unwrap_or_default(),
        password: raw.email_password.clone().unwrap_or_default(),
        sender: raw.email_sender.clone().unwrap_or_default(),
        recipients,
    })
}

fn probe_slack(app_name: &str, raw: &RawSettings) -> ChannelConfig<SlackApiSettings> {
    let mut missing = Vec::new();
    if raw.slack_token.is_none() {
        missing.push(SLACK_TOKEN_ENV);
    }
    if raw.slack_channel_id.is_none() {
        missing.push(SLACK_CHANNEL_ID_ENV);
    }

    if !missing.is_empty() {
        return ChannelConfig::Disabled { missing };
    }

    ChannelConfig::Enabled(SlackApiSettings {
        token: raw.slack_token.clone().unwrap_or_default(),
        channel_id: raw.slack_channel_id.clone().unwrap_or_default(),
        username: app_name.to_string(),
    })
}

fn probe_webhook(raw: &RawSettings) -> ChannelConfig<WebhookSettings> {
    match &raw.slack_webhook_url {
        Some(url) => ChannelConfig::Enabled(WebhookSettings { url: url.clone() }),
        None => ChannelConfig::Disabled {
            missing: vec![SLACK_WEBHOOK_URL_ENV],
        },
    }
}
