use async_trait::async_trait;
use reqwest::header;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmailApiConfig, PushApiConfig};
use crate::resolver::Resolve;
use crate::store::ReportLog;

#[async_trait]
pub trait Notify: Send + Sync {
    /// Send a transactional email. Returns whether the API accepted it;
    /// failures are logged, never raised.
    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> bool;
    /// Send a push note. Same failure contract as `send_email`.
    async fn send_push(&self, title: &str, body: &str) -> bool;
}

/// Notification channels over the SendGrid and Pushbullet HTTP APIs. Both
/// resolve their API hostname through the same custom DNS resolver as the
/// checks and post to the IP-literal endpoint with the API hostname in the
/// `Host` header, so a poisoned system resolver cannot swallow alerts either.
pub struct ApiNotifier {
    resolver: Arc<dyn Resolve>,
    client: reqwest::Client,
    log: Arc<dyn ReportLog>,
    email: EmailApiConfig,
    push: PushApiConfig,
    scheme: &'static str,
    port: u16,
}

impl ApiNotifier {
    pub fn new(
        resolver: Arc<dyn Resolve>,
        email: EmailApiConfig,
        push: PushApiConfig,
        timeout: Duration,
        log: Arc<dyn ReportLog>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            resolver,
            client,
            log,
            email,
            push,
            scheme: "https",
            port: 443,
        })
    }

    #[cfg(test)]
    fn with_endpoint(
        resolver: Arc<dyn Resolve>,
        email: EmailApiConfig,
        push: PushApiConfig,
        log: Arc<dyn ReportLog>,
        scheme: &'static str,
        port: u16,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        Self {
            resolver,
            client,
            log,
            email,
            push,
            scheme,
            port,
        }
    }

    fn endpoint(&self, ip: std::net::Ipv4Addr, path: &str) -> String {
        format!("{}://{}:{}{}", self.scheme, ip, self.port, path)
    }
}

pub(crate) fn email_payload(
    sender: &str,
    recipient: &str,
    subject: &str,
    body: &str,
) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": recipient }] }],
        "from": { "email": sender },
        "subject": subject,
        "content": [{ "type": "text/plain", "value": body }]
    })
}

pub(crate) fn push_payload(title: &str, body: &str) -> serde_json::Value {
    json!({
        "type": "note",
        "title": title,
        "body": body
    })
}

#[async_trait]
impl Notify for ApiNotifier {
    async fn send_email(&self, recipient: &str, subject: &str, body: &str) -> bool {
        let ip = match self.resolver.resolve_ipv4(&self.email.api_hostname).await {
            Ok(ip) => ip,
            Err(_) => {
                self.log.append(&format!(
                    "Failed to resolve email API hostname. Email to {recipient} not sent."
                ));
                return false;
            }
        };

        let url = self.endpoint(ip, &self.email.api_path);
        let payload = email_payload(&self.email.sender, recipient, subject, body);
        let response = self
            .client
            .post(&url)
            .header(header::HOST, self.email.api_hostname.as_str())
            .bearer_auth(&self.email.api_key)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                self.log.append(&format!(
                    "API Email sent successfully to {recipient} with subject '{subject}'"
                ));
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                self.log.append(&format!(
                    "HTTP Error sending email to {recipient}: {status}. Response: {detail}"
                ));
                false
            }
            Err(e) => {
                self.log
                    .append(&format!("Request Error sending email to {recipient}: {e}"));
                false
            }
        }
    }

    async fn send_push(&self, title: &str, body: &str) -> bool {
        let ip = match self.resolver.resolve_ipv4(&self.push.api_hostname).await {
            Ok(ip) => ip,
            Err(_) => {
                self.log
                    .append("Failed to resolve push API hostname. Push notification not sent.");
                return false;
            }
        };

        let url = self.endpoint(ip, &self.push.api_path);
        let response = self
            .client
            .post(&url)
            .header(header::HOST, self.push.api_hostname.as_str())
            .basic_auth(&self.push.access_token, Some(""))
            .json(&push_payload(title, body))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                self.log.append(&format!(
                    "Push notification sent successfully with title '{title}'"
                ));
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let detail = resp.text().await.unwrap_or_default();
                self.log.append(&format!(
                    "HTTP Error sending push: {status}. Response: {detail}"
                ));
                false
            }
            Err(e) => {
                self.log.append(&format!("Request Error sending push: {e}"));
                false
            }
        }
    }
}
