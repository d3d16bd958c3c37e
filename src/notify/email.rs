use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    config::EmailConfig,
    error::{ReminderError, Result},
    notify::{formatters, Notifier, ReminderSummary},
};

/// Sends reminder emails through the SendGrid v3 mail API.
pub struct EmailNotifier {
    client: Client,
    endpoint: String,
    api_key: String,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/v3/mail/send", config.api_base.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            from_address: config.from_address.clone(),
        })
    }

    fn build_payload(&self, to: &str, summary: &ReminderSummary) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from_address },
            "subject": formatters::email_subject(summary),
            "content": [{
                "type": "text/html",
                "value": formatters::email_html(summary),
            }],
        })
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, destination: &str, summary: &ReminderSummary) -> Result<()> {
        let payload = self.build_payload(destination, summary);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(describe_transport_error)?;

        let status = response.status();
        if status.is_success() {
            info!("Reminder email for {} sent ({})", summary.name, status.as_u16());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        debug!("Mail API error body: {}", body);
        Err(ReminderError::Notify(provider_error_message(status.as_u16(), &body)))
    }

    fn channel(&self) -> &'static str {
        "email"
    }
}

fn describe_transport_error(error: reqwest::Error) -> ReminderError {
    if error.is_timeout() {
        return ReminderError::Notify("mail API request timed out".to_string());
    }
    if error.is_connect() {
        return ReminderError::Notify("mail API connection failed".to_string());
    }
    ReminderError::Http(error)
}

/// First `errors[].message` from the provider, else the bare status.
fn provider_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("errors")?
                .get(0)?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .map(|msg| format!("mail API returned {}: {}", status, msg))
        .unwrap_or_else(|| format!("mail API returned {}", status))
}
