//! Bearer-token JSON publishing over HTTP
//!
//! Both supported platforms accept a single POST with a JSON body and
//! answer 201 Created on success. Only the payload shape differs.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::config::{secret_from_env, LinkedInConfig, TwitterConfig};
use crate::error::{PlatformError, Result};
use crate::platforms::{Platform, PublishReceipt};

/// Request body layout per platform
#[derive(Debug, Clone)]
pub enum Payload {
    /// `{"text": ...}`
    Twitter,
    /// Posts API body authored by the given member/organization URN
    LinkedIn { author: Option<String>, author_env: String },
}

impl Payload {
    fn body(&self, content: &str) -> Result<serde_json::Value> {
        match self {
            Payload::Twitter => Ok(serde_json::json!({ "text": content })),
            Payload::LinkedIn { author, author_env } => {
                let author = author.as_ref().ok_or_else(|| {
                    PlatformError::Authentication(format!("LinkedIn author not set: set {}", author_env))
                })?;
                Ok(serde_json::json!({
                    "author": author,
                    "commentary": content,
                    "visibility": "PUBLIC",
                    "lifecycleState": "PUBLISHED",
                    "distribution": { "feedDistribution": "MAIN_FEED" },
                }))
            }
        }
    }
}

pub struct HttpPlatform {
    name: String,
    endpoint: String,
    token: Option<SecretString>,
    token_env: String,
    payload: Payload,
    http: reqwest::Client,
}

impl HttpPlatform {
    pub fn new(
        name: &str,
        endpoint: &str,
        token: Option<SecretString>,
        token_env: &str,
        payload: Payload,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            token,
            token_env: token_env.to_string(),
            payload,
            http,
        })
    }

    pub fn twitter(config: &TwitterConfig, timeout_secs: u64) -> Result<Self> {
        Self::new(
            "twitter",
            &config.endpoint,
            secret_from_env(&config.token_env),
            &config.token_env,
            Payload::Twitter,
            timeout_secs,
        )
    }

    pub fn linkedin(config: &LinkedInConfig, timeout_secs: u64) -> Result<Self> {
        let author = std::env::var(&config.author_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Self::new(
            "linkedin",
            &config.endpoint,
            secret_from_env(&config.token_env),
            &config.token_env,
            Payload::LinkedIn {
                author,
                author_env: config.author_env.clone(),
            },
            timeout_secs,
        )
    }
}

/// Pull the created post's id out of a 201 response
///
/// LinkedIn returns it in `x-restli-id`; Twitter in `data.id`.
fn extract_post_id(header_id: Option<String>, body: &str) -> Option<String> {
    if header_id.is_some() {
        return header_id;
    }
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.pointer("/data/id")
        .or_else(|| json.get("id"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[async_trait]
impl Platform for HttpPlatform {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        let has_author = match &self.payload {
            Payload::Twitter => true,
            Payload::LinkedIn { author, .. } => author.is_some(),
        };
        self.token.is_some() && has_author
    }

    async fn publish(&self, content: &str) -> Result<PublishReceipt> {
        let token = self.token.as_ref().ok_or_else(|| {
            PlatformError::Authentication(format!(
                "{} token not set: set {}",
                self.name, self.token_env
            ))
        })?;
        let body = self.payload.body(content)?;

        debug!("POST {} ({} chars)", self.endpoint, content.chars().count());

        let mut request = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token.expose_secret())
            .json(&body);
        if matches!(self.payload, Payload::LinkedIn { .. }) {
            request = request.header("X-Restli-Protocol-Version", "2.0.0");
        }

        let response = request.send().await.map_err(|e| {
            PlatformError::Network(format!("{} request failed: {}", self.name, e))
        })?;

        let status = response.status().as_u16();
        if status != 201 {
            return Err(PlatformError::UnexpectedStatus {
                platform: self.name.clone(),
                status,
            }
            .into());
        }

        let header_id = response
            .headers()
            .get("x-restli-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await.unwrap_or_default();

        Ok(PublishReceipt {
            platform: self.name.clone(),
            status,
            platform_post_id: extract_post_id(header_id, &text),
        })
    }
}
