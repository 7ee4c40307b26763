use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use futures::future::{BoxFuture, FutureExt, Shared};

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::fallback::FallbackDataset;
use crate::cache::store::{CacheEntry, CacheStore, REPOS_CACHE_KEY};
use crate::error::{Error, Result};
use crate::github::RepositorySource;
use crate::models::{RepositoryRecord, UserStats};

pub const DEFAULT_EXPIRY_SECS: i64 = 5 * 60;
pub const REPOS_PER_PAGE: u32 = 20;

type FetchOutcome = std::result::Result<Vec<RepositoryRecord>, Arc<Error>>;

/// An upstream listing request that every concurrent caller for the same
/// owner awaits, whether it succeeds or fails.
struct InFlight {
    id: u64,
    owner: String,
    fetch: Shared<BoxFuture<'static, FetchOutcome>>,
}

/// Freshness-gated access to a user's repository listing.
///
/// Listings are served from the store while younger than the expiry window.
/// Upstream failures never reach the caller: the listing degrades to the
/// fallback dataset, languages to an empty map and user stats to `None`.
/// The fallback is never written to the store.
pub struct RepositoryCache {
    source: Arc<dyn RepositorySource>,
    clock: Arc<dyn Clock>,
    store: Arc<Mutex<CacheStore>>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    next_fetch_id: AtomicU64,
    fallback: FallbackDataset,
    expiry: Duration,
}

impl RepositoryCache {
    pub fn new(source: Arc<dyn RepositorySource>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            store: Arc::new(Mutex::new(CacheStore::new())),
            in_flight: Arc::new(Mutex::new(None)),
            next_fetch_id: AtomicU64::new(0),
            fallback: FallbackDataset::default(),
            expiry: Duration::seconds(DEFAULT_EXPIRY_SECS),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_store(mut self, store: CacheStore) -> Self {
        self.store = Arc::new(Mutex::new(store));
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackDataset) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub async fn get_repositories(&self, username: &str) -> Vec<RepositoryRecord> {
        match self.try_get_repositories(username).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    malformed = e.is_malformed_response(),
                    "Error fetching repositories for {}, using fallback projects: {}",
                    username,
                    e
                );
                self.fallback.records(username, self.clock.now())
            }
        }
    }

    /// Like [`get_repositories`](Self::get_repositories) but reports the
    /// upstream error instead of substituting the fallback.
    ///
    /// Callers that arrive while a fetch for the same owner is running wait
    /// for it and get its outcome, success or failure.
    pub async fn try_get_repositories(&self, username: &str) -> Result<Vec<RepositoryRecord>> {
        let fetch = {
            // Lock order is store, then in-flight slot.
            let store = lock(&self.store);
            if let Some(records) =
                store.fresh_records(REPOS_CACHE_KEY, username, self.clock.now(), self.expiry)
            {
                tracing::debug!("Serving {} cached repositories for {}", records.len(), username);
                return Ok(records.to_vec());
            }

            let mut in_flight = lock(&self.in_flight);
            match in_flight.as_ref() {
                Some(running) if running.owner == username => {
                    tracing::debug!("Joining in-flight repository fetch for {}", username);
                    running.fetch.clone()
                }
                _ => {
                    let started = self.start_fetch(username);
                    let fetch = started.fetch.clone();
                    *in_flight = Some(started);
                    fetch
                }
            }
        };

        fetch.await.map_err(Error::Shared)
    }

    fn start_fetch(&self, username: &str) -> InFlight {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let owner = username.to_string();
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);

        let fetch = async move {
            let outcome = source.list_repositories(&owner, REPOS_PER_PAGE).await;

            if let Ok(ref records) = outcome {
                tracing::info!("Cached {} repositories for {}", records.len(), owner);
                lock(&store).insert(
                    REPOS_CACHE_KEY,
                    CacheEntry {
                        owner: owner.clone(),
                        records: records.clone(),
                        fetched_at: clock.now(),
                    },
                );
            }

            // A fetch for another owner may have taken the slot meanwhile.
            let mut slot = lock(&in_flight);
            if slot.as_ref().is_some_and(|running| running.id == id) {
                *slot = None;
            }

            outcome.map_err(Arc::new)
        }
        .boxed()
        .shared();

        InFlight {
            id,
            owner: username.to_string(),
            fetch,
        }
    }

    pub async fn get_repository_languages(
        &self,
        username: &str,
        repo: &str,
    ) -> HashMap<String, u64> {
        match self.source.repository_languages(username, repo).await {
            Ok(languages) => languages,
            Err(e) => {
                tracing::warn!("Error fetching languages for {}/{}: {}", username, repo, e);
                HashMap::new()
            }
        }
    }

    /// `None` means the stats are unavailable right now.
    pub async fn get_user_stats(&self, username: &str) -> Option<UserStats> {
        match self.source.user(username).await {
            Ok(user) => Some(user.into()),
            Err(e) => {
                tracing::warn!("Error fetching user stats for {}: {}", username, e);
                None
            }
        }
    }

    pub fn cached_entry(&self) -> Option<CacheEntry> {
        lock(&self.store).get(REPOS_CACHE_KEY).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::models::GitHubUser;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeSource {
        repos: StdMutex<Option<Vec<RepositoryRecord>>>,
        languages: StdMutex<Option<HashMap<String, u64>>>,
        user: StdMutex<Option<GitHubUser>>,
        calls: AtomicUsize,
        delay_ms: u64,
    }

    impl FakeSource {
        fn serving(repos: Vec<RepositoryRecord>) -> Self {
            let source = Self::default();
            source.set_repos(Some(repos));
            source
        }

        fn set_repos(&self, repos: Option<Vec<RepositoryRecord>>) {
            *self.repos.lock().unwrap() = repos;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RepositorySource for FakeSource {
        async fn list_repositories(
            &self,
            _username: &str,
            per_page: u32,
        ) -> Result<Vec<RepositoryRecord>> {
            assert_eq!(per_page, REPOS_PER_PAGE);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
            }
            self.repos
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::GitHubApi("503 Service Unavailable".to_string()))
        }

        async fn repository_languages(
            &self,
            _owner: &str,
            _repo: &str,
        ) -> Result<HashMap<String, u64>> {
            self.languages
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::ParseError("not a languages object".to_string()))
        }

        async fn user(&self, username: &str) -> Result<GitHubUser> {
            self.user
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| Error::UserNotFound(username.to_string()))
        }
    }

    fn record(name: &str, stars: u32) -> RepositoryRecord {
        let at = Utc.with_ymd_and_hms(2024, 4, 1, 9, 30, 0).unwrap();
        RepositoryRecord {
            name: name.to_string(),
            description: Some(format!("{} project", name)),
            language: Some("Rust".to_string()),
            stargazers_count: stars,
            forks_count: 0,
            fork: false,
            homepage: None,
            html_url: format!("https://github.com/octocat/{}", name),
            created_at: at,
            updated_at: at,
        }
    }

    fn setup(source: FakeSource) -> (Arc<FakeSource>, Arc<ManualClock>, RepositoryCache) {
        let source = Arc::new(source);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let cache = RepositoryCache::new(source.clone()).with_clock(clock.clone());
        (source, clock, cache)
    }

    #[tokio::test]
    async fn test_second_call_within_window_is_served_from_cache() {
        let (source, clock, cache) = setup(FakeSource::serving(vec![record("alpha", 1)]));

        let first = cache.get_repositories("octocat").await;
        clock.advance(Duration::minutes(4));
        let second = cache.get_repositories("octocat").await;

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let (source, clock, cache) = setup(FakeSource::serving(vec![record("alpha", 1)]));

        cache.get_repositories("octocat").await;
        source.set_repos(Some(vec![record("beta", 2)]));
        clock.advance(Duration::minutes(5));

        let refreshed = cache.get_repositories("octocat").await;
        assert_eq!(refreshed, vec![record("beta", 2)]);
        assert_eq!(source.calls(), 2);

        let entry = cache.cached_entry().unwrap();
        assert_eq!(entry.records, vec![record("beta", 2)]);
        assert_eq!(entry.fetched_at, clock.now());
    }

    #[tokio::test]
    async fn test_failure_returns_fallback_without_touching_store() {
        let (source, clock, cache) = setup(FakeSource::default());

        let records = cache.get_repositories("octocat").await;
        assert_eq!(records, FallbackDataset::Sample.records("octocat", clock.now()));
        assert_eq!(records.len(), 6);
        assert!(cache.cached_entry().is_none());

        // Fallback is not cached, so the next call asks upstream again and
        // degrades to the same set while upstream keeps failing.
        let again = cache.get_repositories("octocat").await;
        assert_eq!(again, records);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_after_expiry_keeps_stale_entry_but_does_not_serve_it() {
        let (source, clock, cache) = setup(FakeSource::serving(vec![record("alpha", 1)]));

        cache.get_repositories("octocat").await;
        let fetched_at = clock.now();
        source.set_repos(None);
        clock.advance(Duration::minutes(6));

        let records = cache.get_repositories("octocat").await;
        assert_eq!(records.len(), 6);
        assert_eq!(source.calls(), 2);

        let entry = cache.cached_entry().unwrap();
        assert_eq!(entry.records, vec![record("alpha", 1)]);
        assert_eq!(entry.fetched_at, fetched_at);

        source.set_repos(Some(vec![record("gamma", 3)]));
        assert_eq!(cache.get_repositories("octocat").await, vec![record("gamma", 3)]);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_custom_fallback_dataset() {
        let (_source, _clock, cache) = setup(FakeSource::default());
        let cache = cache.with_fallback(FallbackDataset::Custom(vec![record("offline", 0)]));

        assert_eq!(cache.get_repositories("octocat").await, vec![record("offline", 0)]);
    }

    #[tokio::test]
    async fn test_try_get_repositories_surfaces_error() {
        let (_source, _clock, cache) = setup(FakeSource::default());

        let err = cache.try_get_repositories("octocat").await.unwrap_err();
        assert!(matches!(err.root(), Error::GitHubApi(_)));
        assert!(err.to_string().contains("503"), "unexpected error: {}", err);
    }

    #[tokio::test]
    async fn test_different_user_is_not_served_from_cache() {
        let (source, _clock, cache) = setup(FakeSource::serving(vec![record("alpha", 1)]));

        cache.get_repositories("octocat").await;
        cache.get_repositories("hubot").await;

        assert_eq!(source.calls(), 2);
        assert_eq!(cache.cached_entry().unwrap().owner, "hubot");
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let source = FakeSource {
            delay_ms: 50,
            ..FakeSource::serving(vec![record("alpha", 1)])
        };
        let (source, _clock, cache) = setup(source);

        let (a, b, c) = tokio::join!(
            cache.get_repositories("octocat"),
            cache.get_repositories("octocat"),
            cache.get_repositories("octocat"),
        );

        assert_eq!(source.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_failed_fetch() {
        let (source, clock, cache) = setup(FakeSource {
            delay_ms: 50,
            ..FakeSource::default()
        });

        let (a, b, c) = tokio::join!(
            cache.get_repositories("octocat"),
            cache.get_repositories("octocat"),
            cache.get_repositories("octocat"),
        );

        assert_eq!(source.calls(), 1);
        let fallback = FallbackDataset::Sample.records("octocat", clock.now());
        assert_eq!(a, fallback);
        assert_eq!(b, fallback);
        assert_eq!(c, fallback);
        assert!(cache.cached_entry().is_none());

        // The shared failure is not remembered; the next caller retries.
        source.set_repos(Some(vec![record("alpha", 1)]));
        assert_eq!(cache.get_repositories("octocat").await, vec![record("alpha", 1)]);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_strict_callers_all_see_the_shared_error() {
        let (source, _clock, cache) = setup(FakeSource {
            delay_ms: 50,
            ..FakeSource::default()
        });

        let (a, b) = tokio::join!(
            cache.try_get_repositories("octocat"),
            cache.try_get_repositories("octocat"),
        );

        assert_eq!(source.calls(), 1);
        for err in [a.unwrap_err(), b.unwrap_err()] {
            assert!(matches!(err.root(), Error::GitHubApi(_)));
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_for_different_users_fetch_separately() {
        let (source, _clock, cache) = setup(FakeSource {
            delay_ms: 20,
            ..FakeSource::serving(vec![record("alpha", 1)])
        });

        let (a, b) = tokio::join!(
            cache.get_repositories("octocat"),
            cache.get_repositories("hubot"),
        );

        assert_eq!(source.calls(), 2);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_expiry_defaults_to_five_minutes_and_can_be_overridden() {
        let (source, clock, cache) = setup(FakeSource::serving(vec![record("alpha", 1)]));
        assert_eq!(cache.expiry(), Duration::minutes(5));

        let cache = cache.with_expiry(Duration::seconds(30));
        assert_eq!(cache.expiry(), Duration::seconds(30));

        cache.get_repositories("octocat").await;
        clock.advance(Duration::seconds(30));
        cache.get_repositories("octocat").await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_languages_failure_is_empty_map() {
        let (source, _clock, cache) = setup(FakeSource::default());
        assert!(cache.get_repository_languages("octocat", "alpha").await.is_empty());

        *source.languages.lock().unwrap() = Some(HashMap::from([("Rust".to_string(), 4096)]));
        let languages = cache.get_repository_languages("octocat", "alpha").await;
        assert_eq!(languages.get("Rust"), Some(&4096));
    }

    #[tokio::test]
    async fn test_user_stats_unavailable_on_failure() {
        let (source, _clock, cache) = setup(FakeSource::default());
        assert_eq!(cache.get_user_stats("octocat").await, None);

        *source.user.lock().unwrap() = Some(GitHubUser {
            login: "octocat".to_string(),
            name: Some("The Octocat".to_string()),
            avatar_url: "https://avatars.githubusercontent.com/u/583231".to_string(),
            bio: None,
            public_repos: 8,
            followers: 100,
            following: 9,
            created_at: Utc.with_ymd_and_hms(2011, 1, 25, 18, 44, 36).unwrap(),
        });

        let stats = cache.get_user_stats("octocat").await.unwrap();
        assert_eq!(stats.public_repos, 8);
        assert_eq!(stats.followers, 100);
    }
}
