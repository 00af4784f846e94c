//! Platform dispatch
//!
//! Maps a post's platform name to the matching [`Platform`] and reduces
//! the outcome to published / not published. There is no retry: a failed
//! draft stays queued and the next posting trigger picks it up again.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{PlatformError, Result};
use crate::platforms::{Platform, PublishReceipt};

pub struct PlatformPoster {
    platforms: HashMap<String, Box<dyn Platform>>,
}

impl PlatformPoster {
    pub fn new(platforms: Vec<Box<dyn Platform>>) -> Self {
        let platforms = platforms
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        Self { platforms }
    }

    /// Publish `content` to `platform`
    ///
    /// Returns `true` only for an HTTP 201. Unknown platforms, missing
    /// credentials, transport errors and every other status are `false`.
    pub async fn post(&self, platform: &str, content: &str) -> bool {
        match self.publish(platform, content).await {
            Ok(receipt) => {
                info!(
                    "Published to {}{}",
                    receipt.platform,
                    receipt
                        .platform_post_id
                        .map(|id| format!(" ({})", id))
                        .unwrap_or_default()
                );
                true
            }
            Err(e) => {
                warn!("Failed to publish to {}: {}", platform, e);
                false
            }
        }
    }

    async fn publish(&self, platform: &str, content: &str) -> Result<PublishReceipt> {
        let target = self
            .platforms
            .get(platform)
            .ok_or_else(|| PlatformError::UnknownPlatform(platform.to_string()))?;
        target.publish(content).await
    }
}
