use async_trait::async_trait;
use tracing::info;

use super::{MailSender, SenderError};
use crate::notifications::models::MailMessage;

/// Used when no relay is configured: emails are only written to the log.
pub struct LogSender;

#[async_trait]
impl MailSender for LogSender {
    async fn send(&self, message: &MailMessage) -> Result<(), SenderError> {
        info!(to = %message.to, subject = %message.subject, "Email not delivered, no mail relay configured.");
        Ok(())
    }
}
