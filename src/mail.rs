//! Transactional mail delivery.
use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::{AppConfig, MailConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: Message) -> anyhow::Result<()>;
}

/// Posts messages as JSON to an HTTP mail relay.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(endpoint: &str, token: Option<String>, from: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("build mail http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token,
            from: from.to_string(),
        })
    }
}

#[async_trait]
impl MailClient for HttpMailer {
    #[instrument(skip(self, message), fields(to = %message.to))]
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        let body = json!({
            "from": { "email": self.from },
            "to": [{ "email": message.to }],
            "subject": message.subject,
            "html": message.html,
            "text": message.text,
        });

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        req.send()
            .await
            .context("mail relay request")?
            .error_for_status()
            .context("mail relay rejected message")?;

        info!("mail sent");
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl MailClient for LogMailer {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        info!(to = %message.to, subject = %message.subject, body = %message.text, "mail not delivered (no relay configured)");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Box<dyn MailClient>> {
    Ok(match cfg.api_url.as_deref() {
        Some(url) => Box::new(HttpMailer::new(url, cfg.api_token.clone(), &cfg.from)?),
        None => Box::new(LogMailer),
    })
}

/// Message asking `email` to confirm ownership via `token`.
pub fn verification_message(cfg: &AppConfig, email: &str, token: &str) -> Message {
    let link = cfg.verification_link(token);
    Message {
        to: email.to_string(),
        subject: format!("Welcome on board, {}", email),
        html: format!(
            "To confirm your registration, please click on the link below: <a href=\"{}\">Confirm email</a>",
            link
        ),
        text: format!(
            "To confirm your registration, please open the link below: {}",
            link
        ),
    }
}
