//! Post-crawl summary and per-page reports
//!
//! A report is built from the inventory while a job runs. When the job
//! finishes, the report is frozen on the job row, so later jobs re-arming
//! the same URLs never change what an earlier job reported.

use crate::content::{detect_issues, IssueKind, SeoIssue};
use crate::state::{JobStatus, SkipReason, UrlState};
use crate::storage::{PageRecord, Storage, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Aggregate results of one crawl job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlResultSummary {
    pub job_id: i64,
    pub project_id: String,
    pub base_url: String,
    pub status: JobStatus,

    /// Inventory entries owned by the job, in any state
    pub total_pages: u64,
    pub crawled: u64,
    pub failed: u64,
    /// Dispatched entries skipped before a fetch (robots, invalid URL)
    pub skipped: u64,
    /// Links dropped by include/exclude patterns
    pub excluded: u64,
    /// Entries still waiting when the job ended
    pub unclaimed: u64,

    pub duration_secs: Option<f64>,
    pub avg_response_time_ms: f64,
    pub avg_word_count: f64,

    pub internal_links: u64,
    pub external_links: u64,
    pub total_images: u64,
    pub images_missing_alt: u64,

    pub issues_by_severity: BTreeMap<String, u64>,
    pub issues_by_type: BTreeMap<String, u64>,

    /// Pages whose title is shared with at least one other page
    pub duplicate_titles: u64,
    /// Pages whose meta description is shared with at least one other page
    pub duplicate_descriptions: u64,

    pub error_message: Option<String>,
}

impl CrawlResultSummary {
    pub fn total_issues(&self) -> u64 {
        self.issues_by_severity.values().sum()
    }

    /// Crawled share of fetched pages, in percent
    pub fn success_rate(&self) -> f64 {
        let fetched = self.crawled + self.failed;
        if fetched == 0 {
            0.0
        } else {
            (self.crawled as f64 / fetched as f64) * 100.0
        }
    }
}

/// One fetched page of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    pub url: String,
    pub status: Option<u16>,
    pub state: UrlState,
    pub depth: u32,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub word_count: Option<u32>,
    pub response_time_ms: Option<u64>,
    pub issues: Vec<SeoIssue>,
}

/// Summary plus page list, as written to a job's output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub summary: CrawlResultSummary,
    pub pages: Vec<PageReport>,
}

/// Builds the report of a job from its current inventory and content
pub fn build_report<S: Storage + ?Sized>(store: &S, job_id: i64) -> StorageResult<CrawlReport> {
    let pages = store.job_pages(job_id)?;
    let summary = summarize(store, job_id, &pages)?;
    Ok(CrawlReport {
        summary,
        pages: pages.iter().map(page_report).collect(),
    })
}

/// Loads the report of a job
///
/// Finished jobs answer from the report frozen when they ended; jobs
/// without one (still running, or ended before it could be stored) are
/// built from the inventory.
pub fn load_report<S: Storage + ?Sized>(store: &S, job_id: i64) -> StorageResult<CrawlReport> {
    match store.get_job_report(job_id)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => build_report(store, job_id),
    }
}

/// Loads the summary of a job
pub fn load_summary<S: Storage + ?Sized>(
    store: &S,
    job_id: i64,
) -> StorageResult<CrawlResultSummary> {
    Ok(load_report(store, job_id)?.summary)
}

/// Loads the page reports of a job, in fetch order
pub fn page_reports<S: Storage + ?Sized>(store: &S, job_id: i64) -> StorageResult<Vec<PageReport>> {
    Ok(load_report(store, job_id)?.pages)
}

/// Freezes the report of a terminal job and returns it
pub fn finalize_report<S: Storage + ?Sized>(
    store: &mut S,
    job_id: i64,
) -> StorageResult<CrawlReport> {
    let report = build_report(&*store, job_id)?;
    store.save_job_report(job_id, &serde_json::to_string(&report)?)?;
    Ok(report)
}

fn summarize<S: Storage + ?Sized>(
    store: &S,
    job_id: i64,
    pages: &[PageRecord],
) -> StorageResult<CrawlResultSummary> {
    let job = store.get_job(job_id)?;
    let by_state = store.count_by_state(&job.project_id, job_id)?;
    let count = |state: UrlState| by_state.get(&state).copied().unwrap_or(0);
    let by_reason = store.count_skipped_by_reason(&job.project_id, job_id)?;
    let excluded = by_reason
        .get(&SkipReason::PatternExcluded)
        .copied()
        .unwrap_or(0);
    let unclaimed = by_reason
        .get(&SkipReason::BudgetExceeded)
        .copied()
        .unwrap_or(0);

    let mut summary = CrawlResultSummary {
        job_id,
        project_id: job.project_id.clone(),
        base_url: job.base_url.clone(),
        status: job.status,
        total_pages: by_state.values().sum(),
        crawled: count(UrlState::Crawled),
        failed: count(UrlState::Failed),
        skipped: count(UrlState::Skipped).saturating_sub(excluded + unclaimed),
        excluded,
        unclaimed,
        duration_secs: duration_secs(job.started_at.as_deref(), job.completed_at.as_deref()),
        avg_response_time_ms: 0.0,
        avg_word_count: 0.0,
        internal_links: 0,
        external_links: 0,
        total_images: 0,
        images_missing_alt: 0,
        issues_by_severity: BTreeMap::new(),
        issues_by_type: BTreeMap::new(),
        duplicate_titles: 0,
        duplicate_descriptions: 0,
        error_message: job.error_message.clone(),
    };

    let response_times: Vec<u64> = pages
        .iter()
        .filter_map(|p| p.entry.response_time_ms)
        .collect();
    summary.avg_response_time_ms = average(response_times.iter().copied());

    let contents: Vec<_> = pages.iter().filter_map(|p| p.content.as_ref()).collect();
    summary.avg_word_count = average(contents.iter().map(|c| u64::from(c.word_count)));

    for content in &contents {
        summary.internal_links += content.internal_link_count() as u64;
        summary.external_links += content.external_link_count() as u64;
        summary.total_images += content.images.len() as u64;
        summary.images_missing_alt += content.images_missing_alt() as u64;
    }

    for issue in pages.iter().flat_map(page_issues) {
        *summary
            .issues_by_severity
            .entry(issue.severity.as_str().to_string())
            .or_insert(0) += 1;
        *summary
            .issues_by_type
            .entry(issue.kind.as_str().to_string())
            .or_insert(0) += 1;
    }

    summary.duplicate_titles =
        count_duplicates(contents.iter().filter_map(|c| c.title.as_deref()));
    summary.duplicate_descriptions =
        count_duplicates(contents.iter().filter_map(|c| c.meta_description.as_deref()));

    Ok(summary)
}

fn page_report(page: &PageRecord) -> PageReport {
    let entry = &page.entry;
    let content = page.content.as_ref();

    PageReport {
        url: entry.url.clone(),
        status: entry.http_status,
        state: entry.state,
        depth: entry.depth,
        title: content.and_then(|c| c.title.clone()),
        meta_description: content.and_then(|c| c.meta_description.clone()),
        h1: content.and_then(|c| c.primary_heading().map(str::to_string)),
        word_count: content.map(|c| c.word_count),
        response_time_ms: entry.response_time_ms,
        issues: page_issues(page),
    }
}

/// Issues of a page; failed pages only carry their HTTP error
fn page_issues(page: &PageRecord) -> Vec<SeoIssue> {
    match &page.content {
        Some(content) => detect_issues(content),
        None => match page.entry.http_status {
            Some(status) if status >= 400 => vec![SeoIssue::new(
                IssueKind::HttpError,
                format!("HTTP status {}", status),
            )],
            _ => Vec::new(),
        },
    }
}

fn average(values: impl Iterator<Item = u64>) -> f64 {
    let (sum, n) = values.fold((0u64, 0u64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum as f64 / n as f64
    }
}

/// Number of values that occur more than once (case-insensitive, trimmed)
fn count_duplicates<'a>(values: impl Iterator<Item = &'a str>) -> u64 {
    let mut seen: HashMap<String, u64> = HashMap::new();
    for value in values {
        let key = value.trim().to_lowercase();
        if !key.is_empty() {
            *seen.entry(key).or_insert(0) += 1;
        }
    }
    seen.values().filter(|&&n| n > 1).sum()
}

fn duration_secs(started_at: Option<&str>, completed_at: Option<&str>) -> Option<f64> {
    let started = DateTime::parse_from_rfc3339(started_at?).ok()?;
    let ended = match completed_at {
        Some(c) => DateTime::parse_from_rfc3339(c).ok()?.with_timezone(&Utc),
        None => Utc::now(),
    };
    let millis = (ended - started.with_timezone(&Utc)).num_milliseconds();
    Some(millis.max(0) as f64 / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlJobConfig;
    use crate::content::{content_hash, extract_content};
    use crate::state::TriggerSource;
    use crate::storage::SqliteStorage;
    use std::time::Duration;
    use url::Url;

    const PROJECT: &str = "acme";

    fn job_config() -> CrawlJobConfig {
        CrawlJobConfig {
            max_pages: 10,
            max_depth: 3,
            request_delay_ms: 0,
            timeout_ms: 1000,
            user_agent: "TestBot/1.0".to_string(),
            respect_robots_txt: false,
            same_domain_only: true,
            include_patterns: vec![],
            exclude_patterns: vec![],
            store_raw_html: false,
        }
    }

    fn crawl_page(storage: &mut SqliteStorage, job_id: i64, url: &str, html: &str) {
        let id = storage
            .enqueue(PROJECT, url, 0, None, job_id)
            .unwrap()
            .entry_id();
        let page = Url::parse(url).unwrap();
        let mut content = extract_content(html, &page, &page);
        content.http_status = 200;
        content.response_time_ms = 100;
        content.content_hash = content_hash(&content);
        storage.upsert_content(PROJECT, url, job_id, &content).unwrap();
        storage
            .mark_crawled(id, 200, Some(&content.content_hash), 100)
            .unwrap();
    }

    fn populated() -> (SqliteStorage, i64) {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let job_id = storage
            .create_job(
                PROJECT,
                "https://acme.test/",
                &job_config(),
                TriggerSource::Manual,
                None,
            )
            .unwrap();
        storage
            .transition_job(job_id, JobStatus::Running, None)
            .unwrap();

        crawl_page(
            &mut storage,
            job_id,
            "https://acme.test/",
            r#"<html><head><title>Acme home page</title>
               <meta name="description" content="Same description"></head>
               <body><h1>Welcome</h1><a href="/a">A</a><a href="https://x.test/">X</a>
               <img src="/logo.png"></body></html>"#,
        );
        crawl_page(
            &mut storage,
            job_id,
            "https://acme.test/a",
            r#"<html><head><title>Acme home page</title>
               <meta name="description" content="Same description"></head>
               <body><h1>A</h1><img src="/a.png" alt="A"></body></html>"#,
        );

        let failed = storage
            .enqueue(PROJECT, "https://acme.test/gone", 1, None, job_id)
            .unwrap()
            .entry_id();
        storage
            .mark_failed(failed, Some(404), "HTTP 404", Some(50))
            .unwrap();

        storage
            .enqueue(PROJECT, "https://acme.test/later", 1, None, job_id)
            .unwrap();
        storage
            .skip_unclaimed(PROJECT, job_id, SkipReason::BudgetExceeded)
            .unwrap();
        storage
            .transition_job(job_id, JobStatus::Completed, None)
            .unwrap();

        (storage, job_id)
    }

    #[test]
    fn test_build_report_counts() {
        let (storage, job_id) = populated();
        let summary = build_report(&storage, job_id).unwrap().summary;

        assert_eq!(summary.status, JobStatus::Completed);
        assert_eq!(summary.total_pages, 4);
        assert_eq!(summary.crawled, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.excluded, 0);
        assert_eq!(summary.unclaimed, 1);
        assert_eq!(summary.internal_links, 1);
        assert_eq!(summary.external_links, 1);
        assert_eq!(summary.total_images, 2);
        assert_eq!(summary.images_missing_alt, 1);
        assert_eq!(summary.duplicate_titles, 2);
        assert_eq!(summary.duplicate_descriptions, 2);
        assert!(summary.duration_secs.is_some());
        assert!(summary.error_message.is_none());
    }

    #[test]
    fn test_build_report_averages() {
        let (storage, job_id) = populated();
        let summary = build_report(&storage, job_id).unwrap().summary;

        // 100 + 100 + 50 over three fetched pages
        assert!((summary.avg_response_time_ms - 250.0 / 3.0).abs() < 1e-9);
        assert!(summary.avg_word_count > 0.0);
    }

    #[test]
    fn test_issue_histograms() {
        let (storage, job_id) = populated();
        let summary = build_report(&storage, job_id).unwrap().summary;

        assert_eq!(summary.issues_by_type.get("http_error"), Some(&1));
        assert_eq!(summary.issues_by_type.get("images_missing_alt"), Some(&1));
        assert_eq!(summary.issues_by_type.get("thin_content"), Some(&2));
        assert_eq!(
            summary.total_issues(),
            summary.issues_by_type.values().sum::<u64>()
        );
    }

    #[test]
    fn test_page_reports() {
        let (storage, job_id) = populated();
        let pages = page_reports(&storage, job_id).unwrap();

        assert_eq!(pages.len(), 3);
        let home = pages.iter().find(|p| p.url == "https://acme.test/").unwrap();
        assert_eq!(home.title.as_deref(), Some("Acme home page"));
        assert_eq!(home.h1.as_deref(), Some("Welcome"));
        assert_eq!(home.status, Some(200));

        let gone = pages
            .iter()
            .find(|p| p.url == "https://acme.test/gone")
            .unwrap();
        assert_eq!(gone.state, UrlState::Failed);
        assert!(gone.title.is_none());
        assert_eq!(gone.issues.len(), 1);
        assert_eq!(gone.issues[0].kind, IssueKind::HttpError);
    }

    #[test]
    fn test_skips_split_by_reason() {
        let (mut storage, _) = populated();
        let job2 = storage
            .create_job(
                PROJECT,
                "https://acme.test/",
                &job_config(),
                TriggerSource::Manual,
                None,
            )
            .unwrap();
        storage.transition_job(job2, JobStatus::Running, None).unwrap();
        for (url, reason) in [
            ("https://acme.test/private", SkipReason::RobotsDisallowed),
            ("https://acme.test/admin", SkipReason::PatternExcluded),
        ] {
            let id = storage.enqueue(PROJECT, url, 1, None, job2).unwrap().entry_id();
            storage.mark_skipped(id, reason).unwrap();
        }
        storage.enqueue(PROJECT, "https://acme.test/tail", 1, None, job2).unwrap();
        storage
            .skip_unclaimed(PROJECT, job2, SkipReason::BudgetExceeded)
            .unwrap();

        let summary = build_report(&storage, job2).unwrap().summary;
        assert_eq!(summary.total_pages, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.excluded, 1);
        assert_eq!(summary.unclaimed, 1);
    }

    #[test]
    fn test_finished_report_survives_recrawl() {
        let (mut storage, job_id) = populated();
        let frozen = finalize_report(&mut storage, job_id).unwrap();

        // A later job takes over every URL of the first one
        let job2 = storage
            .create_job(
                PROJECT,
                "https://acme.test/",
                &job_config(),
                TriggerSource::Scheduled,
                None,
            )
            .unwrap();
        for url in [
            "https://acme.test/",
            "https://acme.test/a",
            "https://acme.test/gone",
            "https://acme.test/later",
        ] {
            storage.enqueue(PROJECT, url, 0, None, job2).unwrap();
        }
        assert_eq!(build_report(&storage, job_id).unwrap().summary.total_pages, 0);

        let summary = load_summary(&storage, job_id).unwrap();
        assert_eq!(summary.crawled, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total_pages, frozen.summary.total_pages);
        assert_eq!(summary.issues_by_type, frozen.summary.issues_by_type);

        let pages = page_reports(&storage, job_id).unwrap();
        assert_eq!(pages, frozen.pages);
    }

    #[test]
    fn test_running_job_reports_live() {
        let (mut storage, job_id) = populated();
        let job2 = storage
            .create_job(
                PROJECT,
                "https://acme.test/",
                &job_config(),
                TriggerSource::Api,
                None,
            )
            .unwrap();
        storage.transition_job(job2, JobStatus::Running, None).unwrap();
        storage
            .enqueue(PROJECT, "https://acme.test/new", 0, None, job2)
            .unwrap();

        let summary = load_summary(&storage, job2).unwrap();
        assert_eq!(summary.status, JobStatus::Running);
        assert_eq!(summary.total_pages, 1);
        assert!(storage.get_job_report(job_id).unwrap().is_none());
    }

    #[test]
    fn test_count_duplicates() {
        let values = ["A", "a ", "b", "c", "c", "c", ""];
        assert_eq!(count_duplicates(values.iter().copied()), 5);
        assert_eq!(count_duplicates(["x", "y"].iter().copied()), 0);
    }

    #[test]
    fn test_duration_secs() {
        assert_eq!(
            duration_secs(Some("2024-01-01T00:00:00+00:00"), Some("2024-01-01T00:01:30+00:00")),
            Some(90.0)
        );
        assert_eq!(duration_secs(None, None), None);

        let running = duration_secs(Some(&Utc::now().to_rfc3339()), None).unwrap();
        assert!(running < Duration::from_secs(5).as_secs_f64());
    }
}
