//! Autocast - generate and publish social media posts on a timer
//!
//! Once a week a generative-text API drafts a batch of posts into a JSON
//! queue; a few times a day the first draft in the queue is published.

pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod platforms;
pub mod poster;
pub mod scheduler;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AutocastError, Result};
pub use generator::ContentGenerator;
pub use poster::PlatformPoster;
pub use scheduler::{ContentScheduler, PostOutcome, Schedule};
pub use store::QueueStore;
pub use types::{Idea, Post, PostStatus};
