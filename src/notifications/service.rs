use std::sync::Arc;
use tracing::{info, warn};

use super::email::EmailContent;
use super::models::MailMessage;
use super::senders::{log::LogSender, relay::HttpRelaySender, MailSender, SenderError};
use crate::db::entities::{order, product, user};
use crate::server::config::ServerConfig;

pub struct EmailService {
    sender: Arc<dyn MailSender>,
    from: String,
}

impl EmailService {
    pub fn new(sender: Arc<dyn MailSender>, from: impl Into<String>) -> Self {
        Self {
            sender,
            from: from.into(),
        }
    }

    /// Relays through `mail_relay_url` when set, otherwise only logs.
    pub fn from_config(config: &ServerConfig) -> Result<Self, SenderError> {
        let sender: Arc<dyn MailSender> = match &config.mail_relay_url {
            Some(url) => Arc::new(HttpRelaySender::new(url.clone())?),
            None => Arc::new(LogSender),
        };
        Ok(Self::new(sender, config.mail_from.clone()))
    }

    pub async fn send_email(&self, to: &str, subject: &str, html: String) -> Result<(), SenderError> {
        let message = MailMessage {
            from: self.from.clone(),
            to: to.to_string(),
            subject: subject.to_string(),
            html,
        };
        self.sender.send(&message).await
    }

    /// Tells the buyer what they bought. Failures are logged and swallowed so
    /// the already stored order is unaffected.
    pub async fn send_purchase_receipt(
        &self,
        buyer: &user::Model,
        order: &order::Model,
        product: &product::Model,
    ) {
        let subject = purchase_subject(order);
        let body = match purchase_body(buyer, product) {
            Ok(body) => body,
            Err(e) => {
                warn!(order_id = order.id, error = %e, "Failed to render purchase receipt.");
                return;
            }
        };
        match self.send_email(&buyer.email, &subject, body).await {
            Ok(()) => info!(order_id = order.id, "Purchase receipt sent."),
            Err(e) => warn!(order_id = order.id, error = %e, "Failed to send purchase receipt."),
        }
    }
}

pub fn purchase_subject(order: &order::Model) -> String {
    format!("#{} Purchase receipt", order.id)
}

pub fn purchase_body(buyer: &user::Model, product: &product::Model) -> Result<String, SenderError> {
    EmailContent::new()
        .add_heading(format!("Thanks for your purchase, {} {}", buyer.first_name, buyer.surname))
        .add_unordered_list(
            "Here is your purchased product information",
            [
                format!("Price: {:.2}", product.price),
                format!("Ram: {}", product.ram),
                format!("Cores: {}", product.cores),
                format!("Storage: {}", product.storage),
                format!("Transfer: {}", product.transfer),
            ],
        )
        .add_heading("Remember that you can manage each purchased product from my services page!")
        .build()
        .map_err(|e| SenderError::TemplatingError(e.to_string()))
}
