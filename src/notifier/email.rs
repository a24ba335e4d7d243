use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::debug;

use crate::config::SmtpConfig;
use crate::notifier::{MailCredentials, MailTransport, OutgoingMail};
use crate::utils::error::Result;

/// SMTP submission over STARTTLS.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
    port: u16,
    from_name: Option<String>,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            from_name: config.from_name.clone(),
            timeout: Duration::from_secs(config.timeout),
        }
    }

    fn build_message(&self, mail: &OutgoingMail) -> Result<Message> {
        let from = Mailbox::new(self.from_name.clone(), mail.from.parse()?);

        let message = Message::builder()
            .from(from)
            .to(mail.to.parse()?)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())?;

        Ok(message)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: &OutgoingMail, credentials: &MailCredentials) -> Result<()> {
        let message = self.build_message(mail)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
            .port(self.port)
            .credentials(Credentials::new(
                credentials.sender_address.clone(),
                credentials.sender_secret.clone(),
            ))
            .timeout(Some(self.timeout))
            .build();

        let response = mailer.send(message).await?;
        debug!("SMTP server responded with code {}", response.code());
        Ok(())
    }
}
