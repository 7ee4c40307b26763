use crate::cache::repository_cache::DEFAULT_EXPIRY_SECS;
use crate::error::{Error, Result};
use crate::github::client::DEFAULT_API_URL;
use crate::showcase::ranker::DEFAULT_LIMIT;
use chrono::Duration;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub username: Option<String>,
    pub github_token: Option<String>,
    pub api_url: String,
    pub cache_ttl: Duration,
    pub project_limit: usize,
    pub fallback_path: Option<String>,
    pub concurrency_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cache_ttl_secs = parse_or(&lookup, "CACHE_TTL_SECS", DEFAULT_EXPIRY_SECS)?;
        if cache_ttl_secs < 0 {
            return Err(Error::Config(
                "CACHE_TTL_SECS must not be negative".to_string(),
            ));
        }
        let cache_ttl = Duration::try_seconds(cache_ttl_secs).ok_or_else(|| {
            Error::Config(format!("CACHE_TTL_SECS is out of range: {}", cache_ttl_secs))
        })?;

        Ok(Self {
            username: non_empty("GITHUB_USERNAME"),
            github_token: non_empty("GITHUB_TOKEN"),
            api_url: non_empty("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cache_ttl,
            project_limit: parse_or(&lookup, "PROJECT_LIMIT", DEFAULT_LIMIT)?,
            fallback_path: non_empty("FALLBACK_PATH"),
            concurrency_limit: parse_or(&lookup, "CONCURRENCY_LIMIT", 5)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} must be a number, got {:?}", key, value))),
        None => Ok(default),
    }
}

#[derive(Debug, Clone)]
pub struct ShowcaseConfig {
    pub concurrency_limit: usize,
    pub show_progress: bool,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5,
            show_progress: false,
        }
    }
}

impl From<&Config> for ShowcaseConfig {
    fn from(config: &Config) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            show_progress: true,
        }
    }
}
