use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, instrument};

use super::{ActionError, ActionResult};
use crate::{auth::Session, state::AppState, validation::validate_email_fields};

const NOT_CONFIGURED_NOTICE: &str =
    "Email functionality requires configuration. Please set up a transactional email provider.";

pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub body: Bytes,
}

pub struct EmailForm {
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub attachment: Option<Attachment>,
}

pub enum Delivery {
    Sent { provider_id: String },
    NotConfigured,
}

/// Outbound email capability. Swap the implementation to wire a real provider.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &EmailForm) -> anyhow::Result<Delivery>;
}

/// Logs the message and reports that nothing was delivered.
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, email: &EmailForm) -> anyhow::Result<Delivery> {
        info!(
            to = %email.recipient,
            subject = %email.subject,
            message_len = email.message.len(),
            attachment = ?email
                .attachment
                .as_ref()
                .map(|a| (a.file_name.as_str(), a.content_type.as_str(), a.body.len())),
            "email not sent: no provider configured"
        );
        Ok(Delivery::NotConfigured)
    }
}

/// Success does not imply delivery; read `message`.
#[derive(Debug, Serialize)]
pub struct EmailOutcome {
    pub success: bool,
    pub message: String,
}

#[instrument(skip(state, session, email), fields(to = %email.recipient))]
pub async fn send_email(
    state: &AppState,
    session: &Session,
    email: EmailForm,
) -> ActionResult<EmailOutcome> {
    session.require()?;
    validate_email_fields(&email.recipient, &email.subject, &email.message)?;

    match state.mailer.send(&email).await {
        Ok(Delivery::Sent { provider_id }) => Ok(EmailOutcome {
            success: true,
            message: format!("Email sent ({provider_id})"),
        }),
        Ok(Delivery::NotConfigured) => Ok(EmailOutcome {
            success: true,
            message: NOT_CONFIGURED_NOTICE.into(),
        }),
        Err(e) => {
            error!(error = %e, "email send failed");
            Err(ActionError::Backend(
                "Failed to send email. Please check your email service configuration.".into(),
            ))
        }
    }
}
