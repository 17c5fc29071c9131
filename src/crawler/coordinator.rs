//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator drives one job from `pending` to a terminal state:
//! - Seeding the frontier with the base URL
//! - Claiming entries and dispatching them to fetch tasks
//! - Aggregating counters and progress (it is their only writer)
//! - Detecting budget exhaustion, frontier exhaustion, stop and fatal errors
//! - Producing the final summary

use crate::config::CrawlerConfig;
use crate::crawler::events::{emit, CrawlEvent};
use crate::crawler::worker::{CrawlContext, FetchPool, PageOutcome};
use crate::output::{finalize_report, CrawlResultSummary};
use crate::state::{JobStatus, SkipReason, UrlState};
use crate::storage::{with_storage, JobCounters, SharedStorage, Storage};
use crate::CrawlError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Entry id of the fetched page, and what became of it
type FetchTask = (i64, Result<PageOutcome, CrawlError>);

/// Main crawler coordinator structure
pub struct Coordinator {
    storage: SharedStorage,
    pool: Arc<FetchPool>,
    ctx: Arc<CrawlContext>,
    concurrency: usize,
    lease: Duration,
    poll_interval: Duration,
    worker_id: String,
    events: Option<UnboundedSender<CrawlEvent>>,
    stop: watch::Receiver<bool>,
    counters: JobCounters,
    /// Entries this coordinator has claimed and not yet joined
    in_flight: HashSet<i64>,
}

impl Coordinator {
    /// Creates a coordinator for a job already stored as `pending`
    ///
    /// # Arguments
    ///
    /// * `storage` - Shared store holding the job and its frontier
    /// * `pool` - Fetch pool configured for the job
    /// * `ctx` - Job identity and settings
    /// * `crawler` - Pool size, lease and poll settings
    /// * `stop` - Flips to `true` when a graceful stop is requested
    pub fn new(
        storage: SharedStorage,
        pool: Arc<FetchPool>,
        ctx: Arc<CrawlContext>,
        crawler: &CrawlerConfig,
        stop: watch::Receiver<bool>,
    ) -> Self {
        let worker_id = format!("coordinator-{}-{}", std::process::id(), ctx.job_id);
        Self {
            storage,
            pool,
            ctx,
            concurrency: crawler.concurrency.max(1) as usize,
            lease: Duration::from_secs(crawler.lease_timeout),
            poll_interval: Duration::from_millis(crawler.poll_interval),
            worker_id,
            events: None,
            stop,
            counters: JobCounters::default(),
            in_flight: HashSet::new(),
        }
    }

    /// Sends job events to `events`
    pub fn with_events(mut self, events: UnboundedSender<CrawlEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn job_id(&self) -> i64 {
        self.ctx.job_id
    }

    /// Runs the job to a terminal state and returns its summary
    ///
    /// A job that fails mid-crawl still yields a summary (status `failed`,
    /// error message set). An error is returned only when the terminal
    /// state itself could not be recorded.
    pub async fn run(mut self) -> Result<CrawlResultSummary, CrawlError> {
        let job_id = self.ctx.job_id;
        info!("Starting crawl job {} for {}", job_id, self.ctx.base_url);

        let outcome = self.drive().await;
        let (status, message) = match &outcome {
            Ok(status) => (*status, None),
            Err(e) => {
                error!("Crawl job {} failed: {}", job_id, e);
                (JobStatus::Failed, Some(e.to_string()))
            }
        };

        match self.finish(status, message) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("Could not record end of crawl job {}: {}", job_id, e);
                Err(match outcome {
                    Err(original) => original,
                    Ok(_) => e,
                })
            }
        }
    }

    /// The pipeline loop; returns the terminal status to record
    async fn drive(&mut self) -> Result<JobStatus, CrawlError> {
        let ctx = Arc::clone(&self.ctx);
        let lease = self.lease;
        let max_pages = u64::from(ctx.config.max_pages);
        let started = Instant::now();

        let (seed, reclaimed) = with_storage(&self.storage, |s| {
            s.transition_job(ctx.job_id, JobStatus::Running, None)?;
            let seed = s.enqueue(&ctx.project_id, ctx.base_url.as_str(), 0, None, ctx.job_id)?;
            let reclaimed = s.reclaim_expired(&ctx.project_id, ctx.job_id, lease)?;
            Ok((seed, reclaimed))
        })?;

        if seed.is_new_for_job() {
            self.counters.discovered += 1;
        }
        if reclaimed > 0 {
            info!("Reclaimed {} expired leases", reclaimed);
        }
        let counters = self.counters;
        with_storage(&self.storage, |s| {
            s.update_job_progress(ctx.job_id, &counters, 0.0)
        })?;

        emit(
            &self.events,
            CrawlEvent::JobStarted {
                job_id: ctx.job_id,
                project_id: ctx.project_id.clone(),
                base_url: ctx.base_url.to_string(),
            },
        );

        let mut tasks: JoinSet<FetchTask> = JoinSet::new();
        let mut stop = self.stop.clone();
        let mut stop_open = true;
        let mut stopping = *stop.borrow();
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if !stopping {
                self.top_up(&mut tasks, max_pages)?;
            }

            if tasks.is_empty() {
                if stopping {
                    info!("Crawl job {} stopped", ctx.job_id);
                    return Ok(JobStatus::Cancelled);
                }

                if self.counters.done() >= max_pages {
                    info!("Crawl job {} reached its page budget", ctx.job_id);
                    return Ok(JobStatus::Completed);
                }

                let live = with_storage(&self.storage, |s| {
                    s.count_in_flight(&ctx.project_id, ctx.job_id, lease)
                })?;
                if live == 0 {
                    info!("Frontier exhausted for crawl job {}", ctx.job_id);
                    return Ok(JobStatus::Completed);
                }
                debug!("{} entries leased elsewhere, waiting", live);
            }

            tokio::select! {
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    let (entry_id, result) = joined.map_err(CrawlError::Task)?;
                    self.in_flight.remove(&entry_id);
                    match result {
                        Ok(outcome) => self.record(outcome, started)?,
                        Err(e) if e.is_fatal() => return Err(e),
                        Err(e) => warn!("Page processing error: {}", e),
                    }
                }

                changed = stop.changed(), if stop_open && !stopping => {
                    match changed {
                        Ok(()) => {
                            if *stop.borrow() {
                                info!(
                                    "Stop requested for crawl job {}, finishing {} in-flight fetches",
                                    ctx.job_id,
                                    tasks.len()
                                );
                                stopping = true;
                            }
                        }
                        // Every stop handle is gone; nobody can stop us any more
                        Err(_) => stop_open = false,
                    }
                }

                _ = ticker.tick() => {
                    // Fetches still running keep their leases; only abandoned ones expire
                    let busy: Vec<i64> = self.in_flight.iter().copied().collect();
                    let (renewed, reclaimed) = with_storage(&self.storage, |s| {
                        let renewed = s.renew_leases(&busy, &self.worker_id)?;
                        let reclaimed = s.reclaim_expired(&ctx.project_id, ctx.job_id, lease)?;
                        Ok((renewed, reclaimed))
                    })?;
                    if renewed < busy.len() {
                        warn!(
                            "{} in-flight leases were lost before renewal",
                            busy.len() - renewed
                        );
                    }
                    if reclaimed > 0 {
                        info!("Reclaimed {} expired leases", reclaimed);
                    }
                }
            }
        }
    }

    /// Claims entries until the pool is full or the budget is committed
    fn top_up(&mut self, tasks: &mut JoinSet<FetchTask>, max_pages: u64) -> Result<(), CrawlError> {
        let ctx = &self.ctx;

        while tasks.len() < self.concurrency
            && self.counters.done() + (tasks.len() as u64) < max_pages
        {
            let claimed = with_storage(&self.storage, |s| {
                s.claim_next(
                    &ctx.project_id,
                    ctx.job_id,
                    ctx.config.max_depth,
                    &self.worker_id,
                    self.lease,
                )
            })?;

            let Some(entry) = claimed else {
                break;
            };

            debug!("Dispatching {} (depth {})", entry.url, entry.depth);
            self.in_flight.insert(entry.id);
            let pool = Arc::clone(&self.pool);
            let ctx = Arc::clone(&self.ctx);
            let storage = Arc::clone(&self.storage);
            tasks.spawn(async move {
                let entry_id = entry.id;
                (entry_id, pool.process(&ctx, &storage, entry).await)
            });
        }

        Ok(())
    }

    /// Folds one completed page into the job aggregates
    fn record(&mut self, outcome: PageOutcome, started: Instant) -> Result<(), CrawlError> {
        let ctx = Arc::clone(&self.ctx);
        let max_pages = u64::from(ctx.config.max_pages);

        if outcome.recorded {
            match outcome.state {
                UrlState::Crawled => self.counters.crawled += 1,
                UrlState::Failed => self.counters.failed += 1,
                UrlState::Skipped => self.counters.skipped += 1,
                UrlState::Discovered | UrlState::Queued => {}
            }
            self.counters.discovered += outcome.links_discovered;
        }

        let done = self.counters.done();
        let progress = progress_percent(done, max_pages);
        let counters = self.counters;
        with_storage(&self.storage, |s| {
            s.update_job_progress(ctx.job_id, &counters, progress)
        })?;

        emit(
            &self.events,
            CrawlEvent::Page {
                job_id: ctx.job_id,
                url: outcome.url.clone(),
                status: outcome.http_status,
                state: outcome.state,
                depth: outcome.depth,
                response_time_ms: outcome.response_time_ms,
            },
        );

        if let Some(message) = &outcome.error {
            emit(
                &self.events,
                CrawlEvent::Error {
                    job_id: ctx.job_id,
                    url: outcome.url.clone(),
                    message: message.clone(),
                },
            );
        }

        emit(
            &self.events,
            CrawlEvent::Progress {
                job_id: ctx.job_id,
                crawled_pages: done,
                total_pages: counters.discovered.min(max_pages),
                pages_per_minute: pages_per_minute(done, started.elapsed()),
                progress,
            },
        );

        if done > 0 && done % 10 == 0 {
            info!(
                "Progress: {} pages done, {} discovered, {:.0}%",
                done, counters.discovered, progress
            );
        }

        Ok(())
    }

    /// Records the terminal state and freezes the job's report
    fn finish(
        &mut self,
        status: JobStatus,
        message: Option<String>,
    ) -> Result<CrawlResultSummary, CrawlError> {
        let ctx = Arc::clone(&self.ctx);

        let summary = with_storage(&self.storage, |s| {
            let leftover =
                s.skip_unclaimed(&ctx.project_id, ctx.job_id, SkipReason::BudgetExceeded)?;
            if leftover > 0 {
                debug!("Skipped {} unclaimed entries", leftover);
            }
            s.transition_job(ctx.job_id, status, message.as_deref())?;
            Ok(finalize_report(s, ctx.job_id)?.summary)
        })?;

        info!(
            "Crawl job {} {}: {} crawled, {} failed, {} skipped, {} unclaimed",
            ctx.job_id,
            status,
            summary.crawled,
            summary.failed,
            summary.skipped,
            summary.unclaimed
        );

        emit(
            &self.events,
            CrawlEvent::JobFinished {
                job_id: ctx.job_id,
                status,
                error: message,
            },
        );

        Ok(summary)
    }
}

/// `min(100, done / max_pages * 100)`
pub fn progress_percent(done: u64, max_pages: u64) -> f64 {
    if max_pages == 0 {
        return 100.0;
    }
    (done as f64 / max_pages as f64 * 100.0).min(100.0)
}

fn pages_per_minute(done: u64, elapsed: Duration) -> f64 {
    let minutes = elapsed.as_secs_f64() / 60.0;
    if minutes <= 0.0 {
        return 0.0;
    }
    done as f64 / minutes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, 10), 0.0);
        assert_eq!(progress_percent(5, 10), 50.0);
        assert_eq!(progress_percent(10, 10), 100.0);
        assert_eq!(progress_percent(15, 10), 100.0);
    }

    #[test]
    fn test_pages_per_minute() {
        assert_eq!(pages_per_minute(10, Duration::from_secs(60)), 10.0);
        assert_eq!(pages_per_minute(5, Duration::from_secs(30)), 10.0);
        assert_eq!(pages_per_minute(5, Duration::ZERO), 0.0);
    }
}
