//! Job controller: the command surface of the crawl engine
//!
//! Starts crawl jobs as background tasks, stops them, and answers status
//! and summary queries from the store.

use crate::config::{
    validate_base_url, validate_job_config, validate_lease_covers_fetch, Config, CrawlJobConfig,
    CrawlOptions, CrawlerConfig,
};
use crate::crawler::coordinator::Coordinator;
use crate::crawler::events::CrawlEvent;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::worker::{CrawlContext, FetchPool};
use crate::output::{
    load_report, load_summary, page_reports, write_report, CrawlReport, CrawlResultSummary,
    PageReport,
};
use crate::robots::RobotsCache;
use crate::state::TriggerSource;
use crate::storage::{with_storage, JobRecord, SharedStorage, Storage, StorageError};
use crate::CrawlError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Message recorded on jobs found running when a controller takes over
const INTERRUPTED_MESSAGE: &str = "Interrupted: the crawl process exited before the job finished";

/// Requests a graceful stop of one job
///
/// Once stopped, the job claims nothing new, lets in-flight fetches finish
/// and ends as `cancelled`.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// A job running in the background
pub struct RunningCrawl {
    job_id: i64,
    stop: StopHandle,
    handle: JoinHandle<Result<CrawlResultSummary, CrawlError>>,
}

impl RunningCrawl {
    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Waits for the job to reach a terminal state
    pub async fn wait(self) -> Result<CrawlResultSummary, CrawlError> {
        self.handle.await?
    }
}

struct ActiveJob {
    project_id: String,
    stop: StopHandle,
}

/// Starts, stops and reports on crawl jobs
///
/// One controller owns the fetch permits for the process: every job it
/// starts shares the same concurrency bound and robots.txt cache.
pub struct JobController {
    storage: SharedStorage,
    crawler: CrawlerConfig,
    defaults: CrawlJobConfig,
    robots: Arc<RobotsCache>,
    permits: Arc<Semaphore>,
    events: Option<UnboundedSender<CrawlEvent>>,
    active: Arc<Mutex<HashMap<i64, ActiveJob>>>,
    config_hash: Option<String>,
}

impl JobController {
    pub fn new(storage: SharedStorage, config: &Config) -> Self {
        Self {
            storage,
            crawler: config.crawler.clone(),
            defaults: CrawlJobConfig::from_defaults(&config.job, &config.user_agent),
            robots: Arc::new(RobotsCache::new()),
            permits: Arc::new(Semaphore::new(config.crawler.concurrency.max(1) as usize)),
            events: None,
            active: Arc::new(Mutex::new(HashMap::new())),
            config_hash: None,
        }
    }

    /// Sends the events of every job started from now on to `events`
    pub fn with_events(mut self, events: UnboundedSender<CrawlEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Records `hash` on every job started from now on
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Job settings used when a crawl sets no overrides
    pub fn defaults(&self) -> &CrawlJobConfig {
        &self.defaults
    }

    /// Starts a crawl job in the background
    ///
    /// Unset options fall back to the `[job]` defaults. Jobs of the project
    /// left `running` by a dead process are marked failed first.
    ///
    /// # Errors
    ///
    /// * `CrawlError::Config` - invalid base URL or job settings
    /// * `CrawlError::JobAlreadyRunning` - this controller is already
    ///   crawling the project
    /// * `CrawlError::Storage` - the job could not be created
    pub async fn start_crawl(
        &self,
        project_id: &str,
        base_url: &str,
        options: CrawlOptions,
        trigger: TriggerSource,
    ) -> Result<RunningCrawl, CrawlError> {
        let base = validate_base_url(base_url)?;
        let job_config = options.apply(self.defaults.clone());
        validate_job_config(&job_config)?;
        validate_lease_covers_fetch(&self.crawler, job_config.timeout_ms)?;

        let client = build_http_client(
            &job_config.user_agent,
            Duration::from_millis(job_config.timeout_ms),
        )?;

        // Held until the job is registered so two starts cannot race
        let mut active = self.active.lock().await;
        if let Some((&job_id, _)) = active.iter().find(|(_, j)| j.project_id == project_id) {
            return Err(CrawlError::JobAlreadyRunning {
                project_id: project_id.to_string(),
                job_id,
            });
        }

        let job_id = with_storage(&self.storage, |s| {
            let interrupted = s.fail_interrupted_jobs(project_id, INTERRUPTED_MESSAGE)?;
            if interrupted > 0 {
                warn!(
                    "Marked {} interrupted job(s) of project {} as failed",
                    interrupted, project_id
                );
            }
            s.create_job(
                project_id,
                base.as_str(),
                &job_config,
                trigger,
                self.config_hash.as_deref(),
            )
        })?;

        info!(
            "Created crawl job {} for {} ({} pages, depth {})",
            job_id, base, job_config.max_pages, job_config.max_depth
        );

        let pool = Arc::new(FetchPool::new(
            client,
            Arc::clone(&self.permits),
            Arc::clone(&self.robots),
            &job_config,
        ));
        let ctx = Arc::new(CrawlContext::new(job_id, project_id, base, job_config));
        let (stop, stop_rx) = StopHandle::new();

        let mut coordinator = Coordinator::new(
            Arc::clone(&self.storage),
            pool,
            ctx,
            &self.crawler,
            stop_rx,
        );
        if let Some(events) = &self.events {
            coordinator = coordinator.with_events(events.clone());
        }

        active.insert(
            job_id,
            ActiveJob {
                project_id: project_id.to_string(),
                stop: stop.clone(),
            },
        );
        drop(active);

        let storage = Arc::clone(&self.storage);
        let active = Arc::clone(&self.active);
        let output_file = options.output_file;

        let handle = tokio::spawn(async move {
            let result = coordinator.run().await;

            if let (Ok(_), Some(path)) = (&result, output_file) {
                match with_storage(&storage, |s| load_report(&*s, job_id)) {
                    Ok(report) => {
                        if let Err(e) = write_report(&report, Path::new(&path)) {
                            warn!("Failed to write report for job {}: {}", job_id, e);
                        }
                    }
                    Err(e) => warn!("Failed to load report for job {}: {}", job_id, e),
                }
            }

            active.lock().await.remove(&job_id);
            result
        });

        Ok(RunningCrawl {
            job_id,
            stop,
            handle,
        })
    }

    /// Requests a graceful stop of a job started by this controller
    ///
    /// Returns false when the job is not running here.
    pub async fn stop_crawl(&self, job_id: i64) -> bool {
        match self.active.lock().await.get(&job_id) {
            Some(job) => {
                info!("Stopping crawl job {}", job_id);
                job.stop.stop();
                true
            }
            None => false,
        }
    }

    /// IDs of the jobs this controller is currently running
    pub async fn running_jobs(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.active.lock().await.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn job_status(&self, job_id: i64) -> Result<JobRecord, CrawlError> {
        with_storage(&self.storage, |s| s.get_job(job_id)).map_err(job_error)
    }

    /// Most recent jobs of a project, newest first
    pub fn recent_jobs(&self, project_id: &str, limit: usize) -> Result<Vec<JobRecord>, CrawlError> {
        Ok(with_storage(&self.storage, |s| s.list_jobs(project_id, limit))?)
    }

    pub fn summary(&self, job_id: i64) -> Result<CrawlResultSummary, CrawlError> {
        with_storage(&self.storage, |s| load_summary(&*s, job_id)).map_err(job_error)
    }

    pub fn page_reports(&self, job_id: i64) -> Result<Vec<PageReport>, CrawlError> {
        // Unknown jobs have no pages; report them as missing instead
        self.job_status(job_id)?;
        with_storage(&self.storage, |s| page_reports(&*s, job_id)).map_err(job_error)
    }

    pub fn report(&self, job_id: i64) -> Result<CrawlReport, CrawlError> {
        with_storage(&self.storage, |s| load_report(&*s, job_id)).map_err(job_error)
    }
}

fn job_error(e: StorageError) -> CrawlError {
    match e {
        StorageError::JobNotFound(id) => CrawlError::JobNotFound(id),
        other => CrawlError::Storage(other),
    }
}
