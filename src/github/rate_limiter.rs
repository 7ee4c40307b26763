use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;

use crate::error::{Error, Result};

/// Tracks GitHub's primary rate-limit budget from response headers.
///
/// Unlike a blocking limiter this never sleeps: once the budget is spent,
/// `check` fails until the advertised reset time so callers can fall back
/// to other data instead of waiting.
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

#[derive(Default)]
struct RateLimitState {
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RateLimitState::default()),
        }
    }

    pub fn check(&self) -> Result<()> {
        self.check_at(Utc::now())
    }

    fn check_at(&self, now: DateTime<Utc>) -> Result<()> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.remaining == Some(0) {
            if let Some(reset_at) = state.reset_at {
                if reset_at > now {
                    let wait_secs = (reset_at - now).num_seconds().max(1) as u64;
                    tracing::debug!("Rate limit exhausted, {}s until reset", wait_secs);
                    return Err(Error::RateLimited(wait_secs));
                }
            }
        }

        Ok(())
    }

    pub fn update_from_headers(&self, headers: &HeaderMap) {
        let Some(remaining) = header_number::<u32>(headers, "x-ratelimit-remaining") else {
            return;
        };
        let reset_at = header_number::<i64>(headers, "x-ratelimit-reset")
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single());

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.remaining = Some(remaining);
        if reset_at.is_some() {
            state.reset_at = reset_at;
        }

        if remaining == 0 {
            tracing::warn!("GitHub rate limit exhausted until {:?}", state.reset_at);
        }
    }

    pub fn remaining(&self) -> Option<u32> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
