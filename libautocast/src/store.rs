//! Flat-file post queue
//!
//! The queue is a single JSON array on disk and the only state Autocast
//! keeps. Every mutation reads the whole file and rewrites it; there is
//! exactly one writer process.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::types::{Post, PostStatus};

/// JSON-file backed queue of posts
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
}

/// Per-status counts, overall and per platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub drafts: usize,
    pub posted: usize,
    pub by_platform: BTreeMap<String, PlatformStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub drafts: usize,
    pub posted: usize,
}

impl QueueStore {
    /// Bind to `path`; nothing touches the disk until the first read or write
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    /// Read the whole queue in file order
    ///
    /// Entries written without an `id` get one here, and the file is
    /// rewritten at once so the ids stay stable across loads.
    pub fn load(&self) -> Result<Vec<Post>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.display_path(),
                    source,
                }
                .into())
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut posts: Vec<Post> =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: self.display_path(),
                source,
            })?;

        let mut assigned = 0;
        for post in &mut posts {
            if post.assign_missing_id() {
                assigned += 1;
            }
        }
        if assigned > 0 {
            info!(
                "Assigned missing ids to {} queue entries in {}",
                assigned,
                self.display_path()
            );
            self.save(&posts)?;
        }

        Ok(posts)
    }

    /// Overwrite the file with `posts`
    ///
    /// Writes a sibling temp file and renames it over the queue so a crash
    /// mid-write leaves the previous queue intact.
    pub fn save(&self, posts: &[Post]) -> Result<()> {
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.display_path(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(posts).map_err(StoreError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }

    /// Add posts to the end of the queue
    pub fn append(&self, new_posts: Vec<Post>) -> Result<()> {
        if new_posts.is_empty() {
            return Ok(());
        }
        let mut posts = self.load()?;
        posts.extend(new_posts);
        self.save(&posts)
    }

    /// Replace the entry with the same id, keeping its position
    pub fn update(&self, post: &Post) -> Result<()> {
        let mut posts = self.load()?;
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or_else(|| StoreError::NotFound(post.id.clone()))?;
        *slot = post.clone();
        self.save(&posts)
    }

    /// First entry in file order with `status`, optionally on `platform`
    pub fn find_first(&self, status: PostStatus, platform: Option<&str>) -> Result<Option<Post>> {
        let posts = self.load()?;
        Ok(posts
            .into_iter()
            .find(|p| p.status == status && platform.map_or(true, |name| p.platform == name)))
    }

    pub fn stats(&self) -> Result<QueueStats> {
        let posts = self.load()?;
        let mut stats = QueueStats {
            total: posts.len(),
            ..Default::default()
        };

        for post in &posts {
            let entry = stats.by_platform.entry(post.platform.clone()).or_default();
            match post.status {
                PostStatus::Draft => {
                    stats.drafts += 1;
                    entry.drafts += 1;
                }
                PostStatus::Posted => {
                    stats.posted += 1;
                    entry.posted += 1;
                }
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Idea;
    use chrono::Utc;
    use tempfile::TempDir;

    fn post(platform: &str, content: &str) -> Post {
        Post::draft(
            Idea {
                kind: "tip".to_string(),
                platform: platform.to_string(),
                topic: "topic".to_string(),
                hook: "hook".to_string(),
                key_points: vec![],
            },
            content.to_string(),
        )
    }

    fn store_in(dir: &TempDir) -> QueueStore {
        QueueStore::open(dir.path().join("queue.json"))
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).load().unwrap().is_empty());
    }

    #[test]
    fn test_load_blank_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "  \n").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{\"not\": \"an array\"}").unwrap();

        let err = store.load().unwrap_err();
        assert!(err.to_string().contains("not a valid post array"));
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut posts = vec![post("twitter", "a"), post("linkedin", "b"), post("twitter", "c")];
        posts[1].mark_posted(Utc::now());

        store.save(&posts).unwrap();
        assert_eq!(store.load().unwrap(), posts);
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let store = QueueStore::open(dir.path().join("nested/deeper/queue.json"));
        store.save(&[post("twitter", "a")]).unwrap();
        assert_eq!(store.load().unwrap().len(), 1);
        assert!(!dir.path().join("nested/deeper/queue.json.tmp").exists());
    }

    #[test]
    fn test_append_adds_to_end() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(vec![post("twitter", "first")]).unwrap();
        store
            .append(vec![post("linkedin", "second"), post("twitter", "third")])
            .unwrap();

        let contents: Vec<String> = store.load().unwrap().into_iter().map(|p| p.content).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_append_nothing_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.append(Vec::new()).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_update_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let posts = vec![post("twitter", "a"), post("twitter", "b")];
        store.save(&posts).unwrap();

        let mut changed = posts[0].clone();
        changed.mark_posted(Utc::now());
        store.update(&changed).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded[0], changed);
        assert_eq!(loaded[1], posts[1]);
    }

    #[test]
    fn test_update_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&[post("twitter", "a")]).unwrap();

        let stranger = post("twitter", "b");
        let err = store.update(&stranger).unwrap_err();
        assert!(err.to_string().contains(&stranger.id));
    }

    #[test]
    fn test_find_first_draft_in_file_order() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut posts = vec![post("twitter", "a"), post("linkedin", "b"), post("twitter", "c")];
        posts[0].mark_posted(Utc::now());
        store.save(&posts).unwrap();

        let first = store.find_first(PostStatus::Draft, None).unwrap().unwrap();
        assert_eq!(first.content, "b");

        let first_twitter = store
            .find_first(PostStatus::Draft, Some("twitter"))
            .unwrap()
            .unwrap();
        assert_eq!(first_twitter.content, "c");

        assert!(store
            .find_first(PostStatus::Draft, Some("mastodon"))
            .unwrap()
            .is_none());
    }

    const LEGACY_QUEUE: &str = r#"[
        {
            "platform": "twitter",
            "content": "hello",
            "idea": {"type": "tip", "platform": "twitter", "topic": "t", "hook": "h", "key_points": []},
            "created_at": "2026-10-19T09:00:00Z",
            "status": "draft"
        }
    ]"#;

    #[test]
    fn test_load_persists_assigned_ids() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), LEGACY_QUEUE).unwrap();

        let first = store.load().unwrap();
        assert!(!first[0].id.is_empty());

        let second = store.load().unwrap();
        assert_eq!(first[0].id, second[0].id);
        assert!(std::fs::read_to_string(store.path())
            .unwrap()
            .contains(&first[0].id));
    }

    #[test]
    fn test_update_entry_that_had_no_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), LEGACY_QUEUE).unwrap();

        let mut post = store.find_first(PostStatus::Draft, None).unwrap().unwrap();
        post.mark_posted(Utc::now());
        store.update(&post).unwrap();

        assert_eq!(store.load().unwrap()[0].status, PostStatus::Posted);
    }

    #[test]
    fn test_stats_counts_by_platform() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut posts = vec![post("twitter", "a"), post("linkedin", "b"), post("twitter", "c")];
        posts[2].mark_posted(Utc::now());
        store.save(&posts).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.drafts, 2);
        assert_eq!(stats.posted, 1);
        assert_eq!(
            stats.by_platform["twitter"],
            PlatformStats {
                drafts: 1,
                posted: 1
            }
        );
        assert_eq!(stats.by_platform["linkedin"].drafts, 1);
    }
}
