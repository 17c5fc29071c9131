//! seo-crawler: crawl orchestration engine for site audits
//!
//! This crate crawls a website under a page/depth budget, keeps a durable
//! per-project URL inventory, deduplicates page content by hash, and tracks
//! crawl jobs from start to a terminal state.

pub mod config;
pub mod content;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Request timeout for {url}")]
    FetchTimeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Store unavailable: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Crawl job not found: {0}")]
    JobNotFound(i64),

    #[error("Project {project_id} already has a running crawl (job {job_id})")]
    JobAlreadyRunning { project_id: String, job_id: i64 },

    #[error("Fetch pool closed")]
    PoolClosed,

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Returns true if the error must terminate the whole job
    ///
    /// Per-URL failures (timeouts, network errors) are recorded on the
    /// inventory entry and the crawl keeps going. Robots and budget skips
    /// are not errors at all; they are `SkipReason`s on the entry.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_fatal(),
            Self::PoolClosed | Self::Task(_) => true,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::{Config, CrawlJobConfig};
pub use crate::crawler::{CrawlEvent, JobController};
pub use crate::state::{JobStatus, SkipReason, UrlState};
pub use crate::url::{normalize_url, url_key};
