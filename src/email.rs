use crate::config::EmailSettings;
use crate::sink::Notifier;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::error::Error;

/// SMTP implementation of [`Notifier`].
///
/// Wired into the backend when all five `EMAIL_*` settings are present;
/// receives every error-level record and mails it verbatim as the body,
/// subject `[<app> (<env>)] Error Mail`.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
    subject: String,
}

/// Error type returned when the SMTP transport or an address cannot be
/// constructed from the settings.
#[derive(thiserror::Error, Debug)]
pub enum EmailSetupError {
    #[error("invalid SMTP relay {relay}: {reason}")]
    Relay { relay: String, reason: String },

    #[error("invalid mailbox {address}: {reason}")]
    Mailbox { address: String, reason: String },
}

impl EmailNotifier {
    /// Build the notifier from resolved settings.
    ///
    /// `settings.service` is used as the SMTP relay host. `app_name` and
    /// `env` only feed the subject line.
    pub fn new(
        settings: &EmailSettings,
        app_name: &str,
        env: &str,
    ) -> Result<Self, EmailSetupError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.service)
            .map_err(|e| EmailSetupError::Relay {
                relay: settings.service.clone(),
                reason: e.to_string(),
            })?
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        let sender: Mailbox =
            settings
                .sender
                .parse()
                .map_err(|e: lettre::address::AddressError| EmailSetupError::Mailbox {
                    address: settings.sender.clone(),
                    reason: e.to_string(),
                })?;

        let recipients = settings
            .recipients
            .iter()
            .map(|address| {
                address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| EmailSetupError::Mailbox {
                        address: address.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect::<Result<Vec<Mailbox>, _>>()?;

        Ok(EmailNotifier {
            transport,
            sender,
            recipients,
            subject: format!("[{} ({})] Error Mail", app_name, env),
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(self.subject.clone());
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        let email = builder.body(message.to_string())?;

        self.transport.send(email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> EmailSettings {
        EmailSettings {
            service: "smtp.example.com".to_string(),
            username: "mailer".to_string(),
            password: "hunter2".to_string(),
            sender: "svc@example.com".to_string(),
            recipients: vec!["ops@example.com".to_string(), "dev@example.com".to_string()],
        }
    }

    #[test]
    fn builds_subject_from_app_and_env() {
        let notifier = EmailNotifier::new(&settings(), "svc", "staging").unwrap();
        assert_eq!(notifier.subject, "[svc (staging)] Error Mail");
        assert_eq!(notifier.recipients.len(), 2);
    }

    #[test]
    fn rejects_malformed_addresses() {
        let mut bad = settings();
        bad.sender = "not-an-address".to_string();
        assert!(matches!(
            EmailNotifier::new(&bad, "svc", "staging"),
            Err(EmailSetupError::Mailbox { .. })
        ));
    }
}
