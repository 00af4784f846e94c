//! Content generation via a generative-text API
//!
//! Two calls per idea lifecycle: one ideation call that returns a batch of
//! [`Idea`]s, then one drafting call per idea that returns the post text.
//! Ideation degrades to a fixed fallback list; drafting has no fallback.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{secret_from_env, GeneratorConfig};
use crate::error::{GeneratorError, Result};
use crate::types::Idea;

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
}

/// Client for the Anthropic Messages API
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_version: String,
    api_key: Option<SecretString>,
    api_key_env: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// Build a client; the API key is read from `config.api_key_env`
    ///
    /// A missing key is reported on the first call rather than here, so the
    /// daemon still starts and falls back to static ideas.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(GeneratorError::Http)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_version: config.api_version.clone(),
            api_key: secret_from_env(&config.api_key_env),
            api_key_env: config.api_key_env.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for AnthropicClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| GeneratorError::MissingApiKey(self.api_key_env.clone()))?;

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let url = format!("{}/v1/messages", self.base_url);
        debug!("POST {} (model {})", url, self.model);

        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(GeneratorError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::Malformed(e.to_string()))?;

        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GeneratorError::Empty.into());
        }
        Ok(text)
    }
}

/// Ideation and drafting on top of a [`TextGenerator`]
pub struct ContentGenerator {
    backend: Box<dyn TextGenerator>,
    max_tokens: u32,
}

impl ContentGenerator {
    pub fn new(backend: Box<dyn TextGenerator>, max_tokens: u32) -> Self {
        Self {
            backend,
            max_tokens,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let client = AnthropicClient::from_config(config)?;
        Ok(Self::new(Box::new(client), config.max_tokens))
    }

    /// Produce up to `count` ideas in one call
    ///
    /// Never fails: any error yields [`fallback_ideas`].
    pub async fn generate_ideas(&self, count: usize) -> Vec<Idea> {
        match self.try_generate_ideas(count).await {
            Ok(ideas) => {
                debug!("Generated {} idea(s)", ideas.len());
                ideas
            }
            Err(e) => {
                warn!("Idea generation failed, using fallback ideas: {}", e);
                fallback_ideas()
            }
        }
    }

    async fn try_generate_ideas(&self, count: usize) -> Result<Vec<Idea>> {
        let text = self
            .backend
            .complete(&ideas_prompt(count), self.max_tokens)
            .await?;
        parse_ideas(&text, count)
    }

    /// Expand one idea into the full post text
    pub async fn create_post(&self, idea: &Idea) -> Result<String> {
        let text = self
            .backend
            .complete(&post_prompt(idea), self.max_tokens)
            .await?;

        let text = text.trim();
        if text.is_empty() {
            return Err(GeneratorError::Empty.into());
        }
        Ok(text.to_string())
    }
}

/// Parse the ideation reply into at most `count` ideas
///
/// Models tend to wrap JSON in prose or code fences, so only the outermost
/// `[...]` is parsed.
pub fn parse_ideas(text: &str, count: usize) -> Result<Vec<Idea>> {
    let start = text.find('[');
    let end = text.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => {
            return Err(GeneratorError::Malformed("no JSON array in reply".to_string()).into())
        }
    };

    let mut ideas: Vec<Idea> =
        serde_json::from_str(json).map_err(|e| GeneratorError::Malformed(e.to_string()))?;

    if ideas.is_empty() {
        return Err(GeneratorError::Malformed("reply contained no ideas".to_string()).into());
    }

    for idea in &mut ideas {
        idea.platform = idea.platform.trim().to_lowercase();
    }
    ideas.truncate(count);
    Ok(ideas)
}

/// Ideas used when the ideation call fails
pub fn fallback_ideas() -> Vec<Idea> {
    vec![
        Idea {
            kind: "tip".to_string(),
            platform: "twitter".to_string(),
            topic: "Productivity".to_string(),
            hook: "One habit that saves me an hour every day".to_string(),
            key_points: vec![
                "Batch similar tasks together".to_string(),
                "Block focus time on the calendar".to_string(),
                "Review the plan at the end of the day".to_string(),
            ],
        },
        Idea {
            kind: "story".to_string(),
            platform: "linkedin".to_string(),
            topic: "Lessons learned".to_string(),
            hook: "The project that failed taught me the most".to_string(),
            key_points: vec![
                "What went wrong".to_string(),
                "What I changed afterwards".to_string(),
                "What I would tell my past self".to_string(),
            ],
        },
    ]
}

/// Soft length target given to the drafting prompt
pub fn character_guideline(platform: &str) -> usize {
    match platform {
        "twitter" => 280,
        "linkedin" => 3000,
        _ => 500,
    }
}

fn ideas_prompt(count: usize) -> String {
    format!(
        "Generate {count} social media post ideas for this week.\n\
         Spread them across the platforms \"twitter\" and \"linkedin\".\n\
         Reply with only a JSON array. Each element must have the keys \
         \"type\", \"platform\", \"topic\", \"hook\" and \"key_points\" \
         (an array of strings)."
    )
}

fn post_prompt(idea: &Idea) -> String {
    let points = idea
        .key_points
        .iter()
        .map(|p| format!("- {p}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Write a {kind} post for {platform} about \"{topic}\".\n\
         Open with this hook: {hook}\n\
         Cover these points:\n{points}\n\
         Stay under {limit} characters. Reply with the post text only.",
        kind = idea.kind,
        platform = idea.platform,
        topic = idea.topic,
        hook = idea.hook,
        limit = character_guideline(&idea.platform),
    )
}
