use std::path::Path;

use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::error::ApiError;
use crate::models::post::Post;

/// Read access to the site's posts.
#[async_trait]
pub trait PostCatalog: Send + Sync {
    /// Up to `limit` published post ids in random order.
    async fn random_published(&self, limit: usize) -> Result<Vec<u64>, ApiError>;
    async fn permalink(&self, post_id: u64) -> Result<Option<String>, ApiError>;
}

/// Catalog held in memory, optionally loaded from a JSON file of
/// `[{ "id": 1, "permalink": "https://...", "published": true }]`.
pub struct StaticCatalog {
    posts: Vec<Post>,
}

impl StaticCatalog {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(?e, path = %path.display(), "failed to read posts file");
            ApiError::internal("Failed to read posts file")
        })?;
        let posts: Vec<Post> = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(?e, path = %path.display(), "failed to parse posts file");
            ApiError::internal("Invalid posts file")
        })?;
        tracing::info!(count = posts.len(), "post catalog loaded");
        Ok(Self::new(posts))
    }
}

#[async_trait]
impl PostCatalog for StaticCatalog {
    async fn random_published(&self, limit: usize) -> Result<Vec<u64>, ApiError> {
        let published: Vec<u64> = self
            .posts
            .iter()
            .filter(|post| post.published)
            .map(|post| post.id)
            .collect();
        Ok(published
            .choose_multiple(&mut rand::thread_rng(), limit)
            .copied()
            .collect())
    }

    async fn permalink(&self, post_id: u64) -> Result<Option<String>, ApiError> {
        Ok(self
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| post.permalink.clone()))
    }
}
