//! Robots.txt caching implementation
//!
//! Robots files are cached per origin and refreshed after 24 hours.

use crate::crawler::RateLimiter;
use crate::robots::{fetch_robots, ParsedRobots};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

/// Cached robots.txt data for an origin
#[derive(Debug, Clone)]
pub struct CachedRobots {
    pub content: ParsedRobots,

    /// When the robots.txt was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// Checks if the cached robots.txt is older than 24 hours
    pub fn is_stale(&self) -> bool {
        self.age() > Duration::hours(24)
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.fetched_at
    }

    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }
}

/// One origin's cache slot; empty until its robots.txt is first fetched
type Slot = Arc<Mutex<Option<CachedRobots>>>;

/// Shared robots.txt cache for a fetch pool
///
/// Each origin has its own lock, held across that origin's fetch, so its
/// robots.txt is requested at most once per staleness window while other
/// origins keep answering from the cache.
#[derive(Debug, Default)]
pub struct RobotsCache {
    origins: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks `url` against its origin's robots.txt, fetching it if needed
    ///
    /// A fetch takes a slot from `limiter` like any page request.
    pub async fn is_allowed(
        &self,
        client: &reqwest::Client,
        limiter: &RateLimiter,
        url: &Url,
        token: &str,
    ) -> bool {
        let origin = url.origin().ascii_serialization();
        let slot = {
            let mut origins = self.origins.lock().await;
            Arc::clone(origins.entry(origin.clone()).or_default())
        };

        let mut cached = slot.lock().await;
        if cached.as_ref().map_or(true, CachedRobots::is_stale) {
            debug!("Fetching robots.txt for {}", origin);
            limiter.acquire().await;
            *cached = Some(CachedRobots::new(fetch_robots(client, url).await));
        }

        cached
            .as_ref()
            .map_or(true, |c| c.is_allowed(url.as_str(), token))
    }

    /// Number of origins seen so far
    pub async fn len(&self) -> usize {
        self.origins.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
