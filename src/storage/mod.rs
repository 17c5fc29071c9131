//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawl engine:
//! - SQLite database initialization and schema management
//! - Crawl job lifecycle and progress
//! - The per-project URL inventory (the frontier) and its state machine
//! - Page content keyed by `(project, url)`

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::CrawlJobConfig;
use crate::content::NormalizedContent;
use crate::state::{JobStatus, SkipReason, TriggerSource, UrlState};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Storage shared between the orchestrator and its fetch workers
pub type SharedStorage = Arc<Mutex<SqliteStorage>>;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Wraps a backend for sharing across tasks
pub fn shared(storage: SqliteStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

/// Runs `f` with exclusive access to the shared backend
///
/// A poisoned lock means a previous holder panicked mid-operation, so the
/// store is reported unavailable.
pub fn with_storage<T>(
    storage: &SharedStorage,
    f: impl FnOnce(&mut SqliteStorage) -> StorageResult<T>,
) -> StorageResult<T> {
    let mut guard = storage
        .lock()
        .map_err(|e| StorageError::Unavailable(format!("storage lock poisoned: {}", e)))?;
    f(&mut guard)
}

/// A row of the URL inventory
#[derive(Debug, Clone, PartialEq)]
pub struct UrlEntry {
    pub id: i64,
    pub project_id: String,
    pub url: String,
    pub depth: u32,
    pub origin_url: Option<String>,
    pub state: UrlState,
    pub skip_reason: Option<SkipReason>,
    pub http_status: Option<u16>,
    pub content_hash: Option<String>,
    pub last_error: Option<String>,
    pub response_time_ms: Option<u64>,
    pub claimed_by: Option<String>,
    /// Lease start, unix milliseconds
    pub claimed_at: Option<i64>,
    pub first_seen_at: String,
    pub last_crawled_at: Option<String>,
    pub last_crawl_job_id: Option<i64>,
}

/// Result of recording a URL in the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// First time this project sees the URL
    Inserted(i64),
    /// Already recorded for this job
    Existing(i64),
    /// Recorded by an earlier job; now `discovered` again for this one
    Rearmed(i64),
}

impl EnqueueOutcome {
    pub fn entry_id(&self) -> i64 {
        match self {
            Self::Inserted(id) | Self::Existing(id) | Self::Rearmed(id) => *id,
        }
    }

    /// True when the entry became `discovered` for the job by this call
    pub fn is_new_for_job(&self) -> bool {
        !matches!(self, Self::Existing(_))
    }
}

/// Result of a content upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentWrite {
    Inserted,
    Updated,
    Unchanged,
}

/// Aggregate counters of a crawl job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobCounters {
    pub discovered: u64,
    pub crawled: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl JobCounters {
    /// Entries that reached a terminal state after being dispatched
    pub fn done(&self) -> u64 {
        self.crawled + self.failed + self.skipped
    }
}

/// A row of the `crawl_jobs` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: i64,
    pub project_id: String,
    pub base_url: String,
    pub config: CrawlJobConfig,
    pub config_hash: Option<String>,
    pub status: JobStatus,
    pub trigger: TriggerSource,
    pub progress: f64,
    pub counters: JobCounters,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
}

/// A page fetched by a job, joined with its stored content
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub entry: UrlEntry,
    pub content: Option<NormalizedContent>,
}
