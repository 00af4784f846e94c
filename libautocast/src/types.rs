//! Core types for Autocast

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A content idea produced by the ideation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Idea {
    /// Content category, e.g. "tip" or "story"
    #[serde(rename = "type")]
    pub kind: String,
    /// Lowercase platform name the idea targets
    pub platform: String,
    pub topic: String,
    pub hook: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// A single queue entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Empty when an older queue file had no id; the store fills it in on load
    #[serde(default)]
    pub id: String,
    pub platform: String,
    pub content: String,
    pub idea: Idea,
    pub created_at: DateTime<Utc>,
    pub status: PostStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
}

fn new_post_id() -> String {
    Uuid::new_v4().to_string()
}

impl Post {
    /// Create a draft for `idea` with the generated `content`
    pub fn draft(idea: Idea, content: String) -> Self {
        Self {
            id: new_post_id(),
            platform: idea.platform.clone(),
            content,
            idea,
            created_at: Utc::now(),
            status: PostStatus::Draft,
            posted_at: None,
        }
    }

    /// Transition draft -> posted
    pub fn mark_posted(&mut self, at: DateTime<Utc>) {
        self.status = PostStatus::Posted;
        self.posted_at = Some(at);
    }

    pub fn is_draft(&self) -> bool {
        self.status == PostStatus::Draft
    }

    /// Give an id-less entry a fresh UUID; returns whether one was assigned
    pub(crate) fn assign_missing_id(&mut self) -> bool {
        if !self.id.is_empty() {
            return false;
        }
        self.id = new_post_id();
        true
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Posted,
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostStatus::Draft => write!(f, "draft"),
            PostStatus::Posted => write!(f, "posted"),
        }
    }
}

impl std::str::FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(PostStatus::Draft),
            "posted" => Ok(PostStatus::Posted),
            _ => Err(format!(
                "Invalid status: '{}'. Valid options: draft, posted",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_idea() -> Idea {
        Idea {
            kind: "tip".to_string(),
            platform: "twitter".to_string(),
            topic: "Rust error handling".to_string(),
            hook: "Stop unwrapping everything".to_string(),
            key_points: vec!["use ?".to_string(), "thiserror for libraries".to_string()],
        }
    }

    #[test]
    fn test_post_draft_uuid_generation() {
        let post = Post::draft(sample_idea(), "content".to_string());

        assert!(Uuid::parse_str(&post.id).is_ok(), "Post ID should be a valid UUID");
        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.platform, "twitter");
        assert!(post.posted_at.is_none());
    }

    #[test]
    fn test_mark_posted_sets_timestamp() {
        let mut post = Post::draft(sample_idea(), "content".to_string());
        let at = Utc::now();
        post.mark_posted(at);

        assert_eq!(post.status, PostStatus::Posted);
        assert_eq!(post.posted_at, Some(at));
        assert!(!post.is_draft());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PostStatus::Draft).unwrap(), "\"draft\"");
        assert_eq!(serde_json::to_string(&PostStatus::Posted).unwrap(), "\"posted\"");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!("draft".parse::<PostStatus>().unwrap(), PostStatus::Draft);
        assert_eq!("POSTED".parse::<PostStatus>().unwrap(), PostStatus::Posted);
        assert!("failed".parse::<PostStatus>().is_err());
    }

    #[test]
    fn test_idea_uses_type_key() {
        let json = serde_json::to_value(sample_idea()).unwrap();
        assert_eq!(json["type"], "tip");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn test_idea_key_points_default_to_empty() {
        let idea: Idea = serde_json::from_str(
            r#"{"type":"story","platform":"linkedin","topic":"t","hook":"h"}"#,
        )
        .unwrap();
        assert!(idea.key_points.is_empty());
    }

    #[test]
    fn test_post_without_id_is_assigned_once() {
        let json = r#"{
            "platform": "twitter",
            "content": "hello",
            "idea": {"type":"tip","platform":"twitter","topic":"t","hook":"h","key_points":[]},
            "created_at": "2026-10-19T09:00:00Z",
            "status": "draft"
        }"#;
        let mut post: Post = serde_json::from_str(json).unwrap();
        assert!(post.id.is_empty());
        assert!(post.posted_at.is_none());

        assert!(post.assign_missing_id());
        assert!(Uuid::parse_str(&post.id).is_ok());

        let id = post.id.clone();
        assert!(!post.assign_missing_id());
        assert_eq!(post.id, id);
    }

    #[test]
    fn test_posted_at_omitted_for_drafts() {
        let post = Post::draft(sample_idea(), "content".to_string());
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("posted_at").is_none());
    }
}
