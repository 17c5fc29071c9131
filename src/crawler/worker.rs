//! Fetch workers
//!
//! A [`FetchPool`] turns one claimed inventory entry into a terminal state:
//! robots check, rate-limited fetch, extraction, content upsert, and link
//! discovery. Workers report a [`PageOutcome`] and never touch job
//! aggregates; the coordinator is the single writer of those.

use crate::config::CrawlJobConfig;
use crate::content::{content_hash, extract_content, Link};
use crate::crawler::fetcher::{fetch_url, FetchResult};
use crate::crawler::scheduler::RateLimiter;
use crate::robots::RobotsCache;
use crate::state::{SkipReason, UrlState};
use crate::storage::{
    with_storage, ContentWrite, SharedStorage, Storage, StorageError, StorageResult, UrlEntry,
};
use crate::url::{normalize_url, UrlFilter};
use crate::CrawlError;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Everything a worker needs to know about the job it works for
#[derive(Debug, Clone)]
pub struct CrawlContext {
    pub job_id: i64,
    pub project_id: String,
    /// Normalized start URL; defines which links are internal
    pub base_url: Url,
    pub config: CrawlJobConfig,
    pub filter: UrlFilter,
}

impl CrawlContext {
    pub fn new(job_id: i64, project_id: &str, base_url: Url, config: CrawlJobConfig) -> Self {
        let filter = UrlFilter::new(&config.include_patterns, &config.exclude_patterns);
        Self {
            job_id,
            project_id: project_id.to_string(),
            base_url,
            config,
            filter,
        }
    }
}

/// Result of processing one entry
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub entry_id: i64,
    pub url: String,
    pub depth: u32,
    pub state: UrlState,
    pub http_status: Option<u16>,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
    pub content_write: Option<ContentWrite>,
    /// Entries that became `discovered` for the job from this page
    pub links_discovered: u64,
    pub external_links: u64,
    /// False when the entry was already in this state (a reclaimed lease
    /// finished twice); such outcomes must not be counted again
    pub recorded: bool,
}

impl PageOutcome {
    fn new(entry: &UrlEntry, state: UrlState) -> Self {
        Self {
            entry_id: entry.id,
            url: entry.url.clone(),
            depth: entry.depth,
            state,
            http_status: None,
            response_time_ms: None,
            error: None,
            content_write: None,
            links_discovered: 0,
            external_links: 0,
            recorded: true,
        }
    }
}

/// Link bookkeeping for one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Entries newly `discovered` for the job (excluded ones included)
    pub discovered: u64,
    /// Entries immediately skipped by include/exclude patterns
    pub excluded: u64,
    pub external: u64,
    /// Links dropped because their depth would exceed `max_depth`
    pub beyond_depth: u64,
}

/// Bounded pool of fetchers shared by the tasks of one job
pub struct FetchPool {
    client: Client,
    permits: Arc<Semaphore>,
    rate_limiter: RateLimiter,
    robots: Arc<RobotsCache>,
    timeout: Duration,
}

impl FetchPool {
    /// Creates a pool for a job
    ///
    /// `permits` bounds in-flight fetches and may be shared with other jobs
    /// of the same process; the rate limiter is per job.
    pub fn new(
        client: Client,
        permits: Arc<Semaphore>,
        robots: Arc<RobotsCache>,
        config: &CrawlJobConfig,
    ) -> Self {
        Self {
            client,
            permits,
            rate_limiter: RateLimiter::from_millis(config.request_delay_ms),
            robots,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Processes a claimed entry to a terminal state
    ///
    /// Per-URL problems (robots, timeouts, HTTP errors) end up on the entry
    /// and in the outcome. Only store failures are returned as errors, and
    /// those are fatal to the job.
    pub async fn process(
        &self,
        ctx: &CrawlContext,
        storage: &SharedStorage,
        entry: UrlEntry,
    ) -> Result<PageOutcome, CrawlError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CrawlError::PoolClosed)?;

        let url = match Url::parse(&entry.url) {
            Ok(u) => u,
            Err(e) => {
                warn!("Stored URL {} does not parse: {}", entry.url, e);
                return skip(storage, &entry, SkipReason::InvalidUrl);
            }
        };

        if ctx.config.respect_robots_txt
            && !self
                .robots
                .is_allowed(
                    &self.client,
                    &self.rate_limiter,
                    &url,
                    ctx.config.robots_token(),
                )
                .await
        {
            info!("URL {} disallowed by robots.txt", url);
            return skip(storage, &entry, SkipReason::RobotsDisallowed);
        }

        self.rate_limiter.acquire().await;

        debug!("Fetching {} (depth {})", url, entry.depth);
        let result = fetch_url(&self.client, url.as_str(), self.timeout).await;

        let mut outcome = match result {
            FetchResult::Success {
                final_url,
                status_code,
                body,
                response_time_ms,
                ..
            } => {
                let page_url = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
                let mut content = extract_content(&body, &page_url, &ctx.base_url);
                content.http_status = status_code;
                content.response_time_ms = response_time_ms;
                content.body_bytes = body.len() as u64;
                if ctx.config.store_raw_html {
                    content.raw_html = Some(body);
                }
                content.content_hash = content_hash(&content);

                let (write, stats, recorded) = with_storage(storage, |s| {
                    let stats = enqueue_links(s, ctx, &entry, &content.links)?;
                    let write = s.upsert_content(&ctx.project_id, &entry.url, ctx.job_id, &content)?;
                    let recorded = s.mark_crawled(
                        entry.id,
                        status_code,
                        Some(&content.content_hash),
                        response_time_ms,
                    )?;
                    Ok((write, stats, recorded))
                })?;

                debug!(
                    "Crawled {} ({}, {} new links, content {:?})",
                    url, status_code, stats.discovered, write
                );

                let mut outcome = PageOutcome::new(&entry, UrlState::Crawled);
                outcome.http_status = Some(status_code);
                outcome.response_time_ms = Some(response_time_ms);
                outcome.content_write = Some(write);
                outcome.links_discovered = stats.discovered;
                outcome.external_links = stats.external;
                outcome.recorded = recorded;
                outcome
            }

            FetchResult::NotHtml {
                status_code,
                content_type,
                response_time_ms,
            } => {
                debug!("Not HTML: {} ({})", url, content_type);
                let recorded = with_storage(storage, |s| {
                    s.mark_crawled(entry.id, status_code, None, response_time_ms)
                })?;

                let mut outcome = PageOutcome::new(&entry, UrlState::Crawled);
                outcome.http_status = Some(status_code);
                outcome.response_time_ms = Some(response_time_ms);
                outcome.recorded = recorded;
                outcome
            }

            FetchResult::HttpError {
                status_code,
                response_time_ms,
            } => {
                let message = format!("HTTP {}", status_code);
                fail(
                    storage,
                    &entry,
                    Some(status_code),
                    message,
                    Some(response_time_ms),
                )?
            }

            FetchResult::Timeout { response_time_ms } => {
                let message = CrawlError::FetchTimeout {
                    url: entry.url.clone(),
                }
                .to_string();
                fail(storage, &entry, None, message, Some(response_time_ms))?
            }

            FetchResult::NetworkError { error } => {
                let message = CrawlError::Network {
                    url: entry.url.clone(),
                    message: error,
                }
                .to_string();
                fail(storage, &entry, None, message, None)?
            }
        };

        if !outcome.recorded {
            debug!("Entry {} was already {}", outcome.url, outcome.state);
            outcome.links_discovered = 0;
        }

        Ok(outcome)
    }
}

fn skip(
    storage: &SharedStorage,
    entry: &UrlEntry,
    reason: SkipReason,
) -> Result<PageOutcome, CrawlError> {
    let recorded = with_storage(storage, |s| s.mark_skipped(entry.id, reason))?;
    let mut outcome = PageOutcome::new(entry, UrlState::Skipped);
    outcome.recorded = recorded;
    Ok(outcome)
}

fn fail(
    storage: &SharedStorage,
    entry: &UrlEntry,
    http_status: Option<u16>,
    message: String,
    response_time_ms: Option<u64>,
) -> Result<PageOutcome, CrawlError> {
    warn!("Failed {}: {}", entry.url, message);
    let recorded = with_storage(storage, |s| {
        s.mark_failed(entry.id, http_status, &message, response_time_ms)
    })?;

    let mut outcome = PageOutcome::new(entry, UrlState::Failed);
    outcome.http_status = http_status;
    outcome.response_time_ms = response_time_ms;
    outcome.error = Some(message);
    outcome.recorded = recorded;
    Ok(outcome)
}

/// Records the links of a crawled page in the frontier
///
/// Internal links (or every link when `same_domain_only` is off) are
/// enqueued at `depth + 1` as long as that stays within `max_depth`.
/// Links failing the job's include/exclude patterns are enqueued and
/// skipped on the spot so the inventory still shows them.
pub fn enqueue_links<S: Storage + ?Sized>(
    store: &mut S,
    ctx: &CrawlContext,
    entry: &UrlEntry,
    links: &[Link],
) -> StorageResult<LinkStats> {
    let mut stats = LinkStats::default();
    let next_depth = entry.depth + 1;
    let mut seen = HashSet::new();

    for link in links {
        if !link.internal {
            stats.external += 1;
            if ctx.config.same_domain_only {
                continue;
            }
        }

        if next_depth > ctx.config.max_depth {
            stats.beyond_depth += 1;
            continue;
        }

        let normalized = match normalize_url(&link.href) {
            Ok(u) => u,
            Err(e) => {
                debug!("Dropping link {}: {}", link.href, e);
                continue;
            }
        };

        if !seen.insert(normalized.to_string()) {
            continue;
        }

        let outcome = match store.enqueue(
            &ctx.project_id,
            normalized.as_str(),
            next_depth,
            Some(&entry.url),
            ctx.job_id,
        ) {
            Ok(o) => o,
            Err(StorageError::InvalidUrl(e)) => {
                debug!("Dropping link {}: {}", normalized, e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if outcome.is_new_for_job() {
            stats.discovered += 1;
            if !ctx.filter.allows(normalized.as_str()) {
                debug!("Excluded by pattern: {}", normalized);
                store.mark_skipped(outcome.entry_id(), SkipReason::PatternExcluded)?;
                stats.excluded += 1;
            }
        }
    }

    Ok(stats)
}
