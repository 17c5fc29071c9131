//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::config::CrawlJobConfig;
use crate::content::NormalizedContent;
use crate::state::{JobStatus, SkipReason, TriggerSource, UrlState};
use crate::storage::{
    ContentWrite, EnqueueOutcome, JobCounters, JobRecord, PageRecord, UrlEntry,
};
use crate::UrlError;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Crawl job not found: {0}")]
    JobNotFound(i64),

    #[error("Inventory entry not found: {0}")]
    EntryNotFound(i64),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: UrlState, to: UrlState },

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidJobTransition { from: JobStatus, to: JobStatus },

    #[error("Crawl job {0} has not finished")]
    JobNotFinished(i64),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Returns true if the store itself can no longer be trusted
    ///
    /// Rejected inputs and refused transitions leave the store intact.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::InvalidUrl(_) | Self::InvalidTransition { .. }
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all persistence needed by the crawl engine. Each
/// method is atomic with respect to the others; callers share one backend
/// behind a mutex.
pub trait Storage {
    // ===== Job Management =====

    /// Creates a new crawl job in the `pending` state
    ///
    /// # Returns
    ///
    /// The store-assigned job ID
    fn create_job(
        &mut self,
        project_id: &str,
        base_url: &str,
        config: &CrawlJobConfig,
        trigger: TriggerSource,
        config_hash: Option<&str>,
    ) -> StorageResult<i64>;

    /// Gets a job by ID
    fn get_job(&self, job_id: i64) -> StorageResult<JobRecord>;

    /// Gets the most recent jobs of a project, newest first
    fn list_jobs(&self, project_id: &str, limit: usize) -> StorageResult<Vec<JobRecord>>;

    /// Moves a job to a new status
    ///
    /// Stamps `started_at` on `running` and `completed_at` on terminal
    /// states. `error` is only stored for `failed`.
    ///
    /// # Errors
    ///
    /// `InvalidJobTransition` when the move is not allowed from the current
    /// status (terminal jobs never move again).
    fn transition_job(
        &mut self,
        job_id: i64,
        to: JobStatus,
        error: Option<&str>,
    ) -> StorageResult<()>;

    /// Persists counters and progress of a running job
    ///
    /// Progress never decreases. Refused for jobs not in `running`.
    fn update_job_progress(
        &mut self,
        job_id: i64,
        counters: &JobCounters,
        progress: f64,
    ) -> StorageResult<()>;

    /// Marks jobs of a project still `running` as failed
    ///
    /// Used at startup: nothing else can be driving them.
    fn fail_interrupted_jobs(&mut self, project_id: &str, message: &str) -> StorageResult<usize>;

    /// Stores the final report of a terminal job, as JSON
    ///
    /// # Returns
    ///
    /// `true` if written, `false` if the job already has a report
    fn save_job_report(&mut self, job_id: i64, report_json: &str) -> StorageResult<bool>;

    /// Loads the final report of a job, `None` until the job has one
    fn get_job_report(&self, job_id: i64) -> StorageResult<Option<String>>;

    // ===== Frontier Management =====

    /// Records a URL in the project inventory for a job
    ///
    /// Unseen URLs are inserted as `discovered`. A URL already seen by this
    /// job keeps the smaller depth while still `discovered`. A URL last
    /// handled by an earlier job is re-armed for this one.
    fn enqueue(
        &mut self,
        project_id: &str,
        url: &str,
        depth: u32,
        origin_url: Option<&str>,
        job_id: i64,
    ) -> StorageResult<EnqueueOutcome>;

    /// Atomically claims the next eligible entry of a job
    ///
    /// Picks the shallowest `discovered` entry with `depth <= max_depth`, or
    /// a `queued` entry whose lease is older than `lease`. The entry moves
    /// to `queued` under `claimed_by`.
    fn claim_next(
        &mut self,
        project_id: &str,
        job_id: i64,
        max_depth: u32,
        claimed_by: &str,
        lease: Duration,
    ) -> StorageResult<Option<UrlEntry>>;

    /// Returns expired `queued` entries of a job to `discovered`
    fn reclaim_expired(
        &mut self,
        project_id: &str,
        job_id: i64,
        lease: Duration,
    ) -> StorageResult<usize>;

    /// Restarts the leases `claimed_by` holds on `entry_ids`
    ///
    /// Entries that were reclaimed by someone else are left alone.
    fn renew_leases(&mut self, entry_ids: &[i64], claimed_by: &str) -> StorageResult<usize>;

    /// Counts `queued` entries of a job whose lease is still live
    fn count_in_flight(&self, project_id: &str, job_id: i64, lease: Duration)
        -> StorageResult<u64>;

    /// Gets an inventory entry by ID
    fn get_entry(&self, entry_id: i64) -> StorageResult<UrlEntry>;

    /// Gets an inventory entry by its normalized URL
    fn get_entry_by_url(&self, project_id: &str, url: &str) -> StorageResult<Option<UrlEntry>>;

    /// Moves an entry to `crawled`
    ///
    /// # Returns
    ///
    /// `true` if the state changed, `false` if it was already `crawled`
    fn mark_crawled(
        &mut self,
        entry_id: i64,
        http_status: u16,
        content_hash: Option<&str>,
        response_time_ms: u64,
    ) -> StorageResult<bool>;

    /// Moves an entry to `failed`
    fn mark_failed(
        &mut self,
        entry_id: i64,
        http_status: Option<u16>,
        error: &str,
        response_time_ms: Option<u64>,
    ) -> StorageResult<bool>;

    /// Moves an entry to `skipped`
    fn mark_skipped(&mut self, entry_id: i64, reason: SkipReason) -> StorageResult<bool>;

    /// Skips every entry of a job still `discovered`
    fn skip_unclaimed(
        &mut self,
        project_id: &str,
        job_id: i64,
        reason: SkipReason,
    ) -> StorageResult<usize>;

    // ===== Content Store =====

    /// Writes page content when its hash differs from the stored one
    fn upsert_content(
        &mut self,
        project_id: &str,
        url: &str,
        job_id: i64,
        content: &NormalizedContent,
    ) -> StorageResult<ContentWrite>;

    /// Loads the stored content of a page
    fn get_content(&self, project_id: &str, url: &str)
        -> StorageResult<Option<NormalizedContent>>;

    // ===== Statistics =====

    /// Counts a job's inventory entries by state
    fn count_by_state(&self, project_id: &str, job_id: i64)
        -> StorageResult<HashMap<UrlState, u64>>;

    /// Counts a job's `skipped` entries by reason
    fn count_skipped_by_reason(
        &self,
        project_id: &str,
        job_id: i64,
    ) -> StorageResult<HashMap<SkipReason, u64>>;

    /// Gets every page a job fetched (crawled or failed), in fetch order
    fn job_pages(&self, job_id: i64) -> StorageResult<Vec<PageRecord>>;
}
