pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::MultiPart;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::json;

use crate::config::{EmailConfig, EmailTransport, SmtpConfig};

/// A rendered message ready for delivery. The sender address belongs to the
/// mailer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    /// Sent as an idempotency key where the transport supports one.
    pub reference: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver the message. Returns the provider's message id when it hands
    /// one back.
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String>;
}

pub fn build_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, String> {
    match &config.transport {
        EmailTransport::Api { base_url, api_key } => Ok(Arc::new(ApiMailer::new(
            base_url,
            api_key.expose(),
            &config.from,
        )?)),
        EmailTransport::Smtp(smtp) => Ok(Arc::new(SmtpMailer::new(smtp, &config.from)?)),
    }
}

/// Transactional email over a Resend-compatible HTTP API.
pub struct ApiMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: String,
}

impl ApiMailer {
    pub fn new(base_url: &str, api_key: &str, from: &str) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ApiMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
        let mut req = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": &self.from,
                "to": [&email.to],
                "subject": &email.subject,
                "html": &email.html,
                "text": &email.text,
            }));

        if let Some(reference) = &email.reference {
            req = req.header("Idempotency-Key", reference);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| format!("Email API request failed: {e}"))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            let detail = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(err) => match err.name {
                    Some(name) => format!("{name}: {}", err.message),
                    None => err.message,
                },
                Err(_) => body.chars().take(512).collect(),
            };
            return Err(format!("Email API returned {}: {detail}", status.as_u16()));
        }

        let id = serde_json::from_str::<SendResponse>(&body)
            .ok()
            .and_then(|r| r.id);
        if id.is_none() {
            tracing::warn!(
                "Email to {} accepted without a message id, response: {body}",
                email.to
            );
        }
        Ok(id)
    }
}

/// SMTP delivery with a multipart/alternative body.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig, from: &str) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.expose().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<Option<String>, String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(email.subject.as_str())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| format!("Failed to build email: {e}"))?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(response.message().next().map(str::to_string))
    }
}
