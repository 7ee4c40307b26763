use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::RepositoryRecord;

/// The only key repository listings are stored under.
pub const REPOS_CACHE_KEY: &str = "repos";

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub owner: String,
    pub records: Vec<RepositoryRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        now - self.fetched_at < expiry
    }
}

/// In-process key/value store backing [`RepositoryCache`](super::RepositoryCache).
///
/// Entries live until overwritten; nothing is evicted or persisted.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Payload under `key` if it belongs to `owner` and is younger than `expiry`.
    pub fn fresh_records(
        &self,
        key: &str,
        owner: &str,
        now: DateTime<Utc>,
        expiry: Duration,
    ) -> Option<&[RepositoryRecord]> {
        self.get(key)
            .filter(|entry| entry.owner == owner && entry.is_fresh(now, expiry))
            .map(|entry| entry.records.as_slice())
    }
}
