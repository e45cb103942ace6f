use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{MailSender, SenderError};
use crate::notifications::models::MailMessage;

/// Posts each email as JSON to an HTTP mail relay.
pub struct HttpRelaySender {
    client: Client,
    url: String,
}

impl HttpRelaySender {
    pub fn new(url: impl Into<String>) -> Result<Self, SenderError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SenderError::InvalidConfiguration(format!(
                "Mail relay URL must be http(s): {url}"
            )));
        }
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl MailSender for HttpRelaySender {
    async fn send(&self, message: &MailMessage) -> Result<(), SenderError> {
        let response = self.client.post(&self.url).json(message).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error body".to_string());
            return Err(SenderError::SendFailed(format!(
                "Mail relay returned status {status}: {error_body}"
            )));
        }

        Ok(())
    }
}
