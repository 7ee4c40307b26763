use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::github::rate_limiter::RateLimiter;
use crate::github::source::RepositorySource;
use crate::models::{GitHubUser, RepositoryRecord};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
}

impl GitHubClient {
    /// Build a client; without a token requests are anonymous and subject to
    /// the lower unauthenticated rate limit.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("gitfolio/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(),
            base_url: DEFAULT_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub async fn get_user(&self, username: &str) -> Result<GitHubUser> {
        let url = self.endpoint(&["users", username])?;
        tracing::info!("Fetching user: {}", username);
        self.get_json(url, || Error::UserNotFound(username.to_string()))
            .await
    }

    pub async fn get_user_repos(&self, username: &str, per_page: u32) -> Result<Vec<RepositoryRecord>> {
        let mut url = self.endpoint(&["users", username, "repos"])?;
        url.query_pairs_mut()
            .append_pair("sort", "updated")
            .append_pair("per_page", &per_page.to_string());
        tracing::info!("Fetching repositories for: {}", username);
        self.get_json(url, || Error::UserNotFound(username.to_string()))
            .await
    }

    pub async fn get_repo_languages(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<HashMap<String, u64>> {
        let url = self.endpoint(&["repos", owner, repo, "languages"])?;
        tracing::debug!("Fetching languages for: {}/{}", owner, repo);
        self.get_json(url, || Error::RepoNotFound(format!("{}/{}", owner, repo)))
            .await
    }

    /// Appends `segments` to the base URL, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid GitHub API URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("GitHub API URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T, F>(&self, url: Url, not_found: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> Error,
    {
        self.rate_limiter.check()?;

        let response = self.client.get(url.clone()).send().await?;
        self.rate_limiter.update_from_headers(response.headers());

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Request to {} failed: {} - {}",
                url, status, body
            )));
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| Error::ParseError(format!("Unexpected response from {}: {}", url, e)))
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_repositories(
        &self,
        username: &str,
        per_page: u32,
    ) -> Result<Vec<RepositoryRecord>> {
        self.get_user_repos(username, per_page).await
    }

    async fn repository_languages(&self, owner: &str, repo: &str) -> Result<HashMap<String, u64>> {
        self.get_repo_languages(owner, repo).await
    }

    async fn user(&self, username: &str) -> Result<GitHubUser> {
        self.get_user(username).await
    }
}
