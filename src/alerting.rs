use reqwest::Client;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{event, Level};
use url::Url;

#[derive(Serialize, Debug, PartialEq)]
pub struct AlertPayload {
    pub title: String,
    pub text: String,
}

pub fn build_alert_payload(
    function_name: &str,
    error_message: &str,
    raised_at: OffsetDateTime,
) -> AlertPayload {
    let timestamp = raised_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| raised_at.unix_timestamp().to_string());
    AlertPayload {
        title: format!("Lambda Failure Notification : {}", function_name),
        text: format!(
            "Lambda function **'{}'** encountered an error.\n\n**Error Details:**\n{}\n\n**Timestamp:** {}\n\nPlease investigate the issue and check CloudWatch logs for more details.",
            function_name, error_message, timestamp
        ),
    }
}

/// Best-effort failure alerts. Delivery problems are logged and swallowed.
#[derive(Debug, Clone)]
pub struct Alerter {
    webhook_url: Option<Url>,
    function_name: String,
    client: Client,
}

impl Alerter {
    pub fn new(webhook_url: Option<Url>, function_name: &str, client: Client) -> Alerter {
        Alerter {
            webhook_url,
            function_name: function_name.to_string(),
            client,
        }
    }

    pub async fn send_failure_notification(&self, error_message: &str) {
        let payload = build_alert_payload(
            &self.function_name,
            error_message,
            OffsetDateTime::now_utc(),
        );
        let webhook_url = match &self.webhook_url {
            Some(url) => url,
            None => {
                event!(
                    Level::WARN,
                    "No alert webhook configured, alert for {} only logged: {}",
                    &self.function_name,
                    error_message
                );
                return;
            }
        };
        let result = self
            .client
            .post(webhook_url.as_str())
            .json(&payload)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                event!(
                    Level::INFO,
                    "Webhook notification sent successfully for Lambda function: {}",
                    &self.function_name
                );
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                event!(
                    Level::WARN,
                    "Failed to send Webhook notification. Response: {}, {}",
                    status,
                    body
                );
            }
            Err(error) => {
                event!(
                    Level::ERROR,
                    "Failed to send failure notification via Webhook: {:?}",
                    error
                );
            }
        }
    }
}
