//! Crawler module for crawl jobs
//!
//! This module contains the crawl engine, including:
//! - HTTP fetching with a hard per-request timeout
//! - Pool-wide request pacing
//! - Fetch workers that move frontier entries to terminal states
//! - The per-job coordinator loop
//! - The job controller used to start, stop and inspect jobs

mod controller;
mod coordinator;
mod events;
mod fetcher;
mod scheduler;
mod worker;

pub use controller::{JobController, RunningCrawl, StopHandle};
pub use coordinator::{progress_percent, Coordinator};
pub use events::CrawlEvent;
pub use fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult};
pub use scheduler::RateLimiter;
pub use worker::{enqueue_links, CrawlContext, FetchPool, LinkStats, PageOutcome};
