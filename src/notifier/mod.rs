pub mod email;

pub use email::SmtpMailer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::models::{NotificationOutcome, ProductSpec, StockStatus};
use crate::utils::error::Result;

/// Sender login plus recipient. All three must be non-empty to send.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MailCredentials {
    pub sender_address: String,
    pub sender_secret: String,
    pub recipient_address: String,
}

impl MailCredentials {
    pub fn is_complete(&self) -> bool {
        !self.sender_address.trim().is_empty()
            && !self.sender_secret.is_empty()
            && !self.recipient_address.trim().is_empty()
    }
}

/// A composed plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers a composed message. Implementations must be safe to share.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutgoingMail, credentials: &MailCredentials) -> Result<()>;
}

/// Composes and sends in-stock alerts.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    credentials: MailCredentials,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, credentials: MailCredentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub async fn notify(&self, product: &ProductSpec, status: &StockStatus) -> NotificationOutcome {
        if !status.is_in_stock() {
            debug!(
                "Not notifying for '{}': status is {}",
                product.name, status.state
            );
            return NotificationOutcome::NotAttempted;
        }

        if !self.credentials.is_complete() {
            error!("Email credentials not found; skipping notification for '{}'", product.name);
            return NotificationOutcome::SkippedNoCredentials;
        }

        info!("Item '{}' is in stock! Sending email notification...", product.name);
        let mail = compose(product, &self.credentials);

        match self.transport.send(&mail, &self.credentials).await {
            Ok(()) => {
                info!("Email notification sent for '{}'", product.name);
                NotificationOutcome::Sent
            }
            Err(e) => {
                warn!("Failed to send email for '{}': {}", product.name, e);
                NotificationOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Build the alert message for `product`.
pub fn compose(product: &ProductSpec, credentials: &MailCredentials) -> OutgoingMail {
    OutgoingMail {
        from: credentials.sender_address.clone(),
        to: credentials.recipient_address.clone(),
        subject: format!("In Stock Alert: {}", product.name),
        body: format!(
            "The product you are tracking is now back in stock!\n\n\
             Product: {}\n\
             Buy it here: {}\n",
            product.name, product.url
        ),
    }
}
