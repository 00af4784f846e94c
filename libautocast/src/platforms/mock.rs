//! Mock platform implementation for testing
//!
//! Simulates successful and failing publishes without network access, and
//! records what it was asked to publish so tests can assert on it.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{Platform, PublishReceipt};

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name (e.g. "twitter")
    pub name: String,

    /// HTTP status the simulated endpoint answers with; only 201 succeeds
    pub status: u16,

    /// Whether publishing fails before any "request" is made
    pub network_error: Option<String>,

    pub is_configured: bool,

    /// Number of times publish has been called
    pub publish_call_count: Arc<Mutex<usize>>,

    /// Content passed to successful publishes
    pub published_content: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            status: 201,
            network_error: None,
            is_configured: true,
            publish_call_count: Arc::new(Mutex::new(0)),
            published_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock platform for testing
///
/// Clones share their counters, so a test can keep one handle and give the
/// other to a poster.
#[derive(Debug, Clone)]
pub struct MockPlatform {
    config: MockConfig,
}

impl MockPlatform {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// A platform that answers 201
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// A platform that answers with `status`
    pub fn with_status(name: &str, status: u16) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            status,
            ..Default::default()
        })
    }

    /// A platform whose requests never reach the server
    pub fn network_failure(name: &str, error: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            network_error: Some(error.to_string()),
            ..Default::default()
        })
    }

    /// A platform without credentials
    pub fn not_configured(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            is_configured: false,
            ..Default::default()
        })
    }

    pub fn publish_call_count(&self) -> usize {
        *self.config.publish_call_count.lock().unwrap()
    }

    pub fn published_content(&self) -> Vec<String> {
        self.config.published_content.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured
    }

    async fn publish(&self, content: &str) -> Result<PublishReceipt> {
        *self.config.publish_call_count.lock().unwrap() += 1;

        if !self.config.is_configured {
            return Err(PlatformError::Authentication(format!(
                "{} token not set",
                self.config.name
            ))
            .into());
        }

        if let Some(error) = &self.config.network_error {
            return Err(PlatformError::Network(error.clone()).into());
        }

        if self.config.status != 201 {
            return Err(PlatformError::UnexpectedStatus {
                platform: self.config.name.clone(),
                status: self.config.status,
            }
            .into());
        }

        self.config
            .published_content
            .lock()
            .unwrap()
            .push(content.to_string());

        Ok(PublishReceipt {
            platform: self.config.name.clone(),
            status: 201,
            platform_post_id: Some(format!("{}:mock-{}", self.config.name, uuid::Uuid::new_v4())),
        })
    }
}
