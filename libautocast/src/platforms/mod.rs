//! Platform abstraction and implementations
//!
//! Each platform knows how to turn post text into one authenticated HTTP
//! request against its publish endpoint.
//!
//! # Examples
//!
//! ```no_run
//! use libautocast::config::TwitterConfig;
//! use libautocast::platforms::{http::HttpPlatform, Platform};
//!
//! # async fn example() -> libautocast::error::Result<()> {
//! let platform = HttpPlatform::twitter(&TwitterConfig::default(), 30)?;
//!
//! if platform.is_configured() {
//!     let receipt = platform.publish("Hello from autocast").await?;
//!     println!("Published to {} (HTTP {})", receipt.platform, receipt.status);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::config::PlatformsConfig;
use crate::error::Result;

pub mod http;

// Mock platform is available for all builds (not just tests) to support integration tests
pub mod mock;

/// Outcome of a successful publish call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    pub platform: String,
    pub status: u16,
    /// Platform-assigned id, when the response carries one
    pub platform_post_id: Option<String>,
}

/// A publish target
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lowercase identifier matching `Post::platform` (e.g. "twitter")
    fn name(&self) -> &str;

    /// Whether the credentials this platform needs are present
    fn is_configured(&self) -> bool;

    /// Publish `content`
    ///
    /// # Errors
    ///
    /// - `PlatformError::Authentication` when credentials are missing
    /// - `PlatformError::Network` when the request cannot be sent
    /// - `PlatformError::UnexpectedStatus` for anything but HTTP 201
    async fn publish(&self, content: &str) -> Result<PublishReceipt>;
}

/// Build every enabled platform from configuration
///
/// Platforms whose credentials are missing are still built; they fail at
/// publish time so the draft stays queued until the token appears.
pub fn create_platforms(config: &PlatformsConfig, timeout_secs: u64) -> Result<Vec<Box<dyn Platform>>> {
    let mut platforms: Vec<Box<dyn Platform>> = Vec::new();

    if config.twitter.enabled {
        platforms.push(Box::new(http::HttpPlatform::twitter(&config.twitter, timeout_secs)?));
    }

    if config.linkedin.enabled {
        platforms.push(Box::new(http::HttpPlatform::linkedin(&config.linkedin, timeout_secs)?));
    }

    for platform in &platforms {
        if !platform.is_configured() {
            tracing::warn!(
                "Platform {} has no credentials; its drafts will not publish",
                platform.name()
            );
        }
    }

    Ok(platforms)
}
