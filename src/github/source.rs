use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::models::{GitHubUser, RepositoryRecord};

/// Upstream that can list a user's repositories and related metadata.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Up to `per_page` repositories owned by `username`, most recently
    /// updated first.
    async fn list_repositories(&self, username: &str, per_page: u32)
        -> Result<Vec<RepositoryRecord>>;
    async fn repository_languages(&self, owner: &str, repo: &str) -> Result<HashMap<String, u64>>;
    async fn user(&self, username: &str) -> Result<GitHubUser>;
}
