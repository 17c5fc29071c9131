//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run whole
//! crawl jobs through the job controller.

use seo_crawler::config::{
    Config, CrawlOptions, CrawlerConfig, JobDefaults, OutputConfig, UserAgentConfig,
};
use seo_crawler::crawler::JobController;
use seo_crawler::state::{JobStatus, SkipReason, TriggerSource, UrlState};
use seo_crawler::storage::{open_storage, shared, with_storage, SharedStorage, Storage};
use seo_crawler::{CrawlError, CrawlEvent};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate, Times};

const PROJECT: &str = "acme";

/// Creates a test configuration with fast polling and no request delay
fn create_test_config(db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            concurrency: 4,
            lease_timeout: 300,
            poll_interval: 20,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.display().to_string(),
            summary_path: None,
        },
        project: None,
        job: JobDefaults {
            max_pages: 50,
            max_depth: 3,
            request_delay: 0,
            timeout: 2000,
            ..JobDefaults::default()
        },
    }
}

struct Harness {
    _dir: TempDir,
    db_path: PathBuf,
    storage: SharedStorage,
    config: Config,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("crawl.db");
        let mut config = create_test_config(&db_path);
        adjust(&mut config);
        let storage = shared(open_storage(&db_path).unwrap());
        Self {
            _dir: dir,
            db_path,
            storage,
            config,
        }
    }

    fn controller(&self) -> JobController {
        JobController::new(Arc::clone(&self.storage), &self.config)
    }
}

fn html_page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect();
    let body = format!(
        "<html><head><title>{}</title></head><body><h1>{}</h1>{}</body></html>",
        title, title, anchors
    );
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

async fn mount_page(
    server: &MockServer,
    route: &str,
    response: ResponseTemplate,
    times: impl Into<Times>,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

/// Paths requested from the server, robots.txt excluded
async fn page_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p != "/robots.txt")
        .collect()
}

fn base_url(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

#[tokio::test]
async fn test_three_page_site() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/a", "/b"]), 1).await;
    mount_page(&server, "/a", html_page("Page A of Acme", &["/", "/b"]), 1).await;
    mount_page(&server, "/b", html_page("Page B of Acme", &["/a"]), 1).await;

    let harness = Harness::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = harness.controller().with_events(tx);

    let options = CrawlOptions {
        max_pages: Some(3),
        max_depth: Some(1),
        ..Default::default()
    };
    let running = controller
        .start_crawl(PROJECT, &base_url(&server), options, TriggerSource::Manual)
        .await
        .unwrap();
    let job_id = running.job_id();
    let summary = running.wait().await.unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.total_pages, 3);
    assert_eq!(summary.crawled, 3);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.unclaimed, 0);
    assert!(summary.error_message.is_none());

    // One content row per page, each with its own hash
    let urls = [
        base_url(&server),
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
    ];
    let hashes: HashSet<String> = urls
        .iter()
        .map(|url| {
            with_storage(&harness.storage, |s| s.get_content(PROJECT, url))
                .unwrap()
                .unwrap()
                .content_hash
        })
        .collect();
    assert_eq!(hashes.len(), 3);
    assert!(hashes.iter().all(|h| !h.is_empty()));

    let job = controller.job_status(job_id).unwrap();
    assert_eq!(job.counters.discovered, 3);
    assert_eq!(job.counters.crawled, 3);
    assert_eq!(job.progress, 100.0);
    assert!(job.completed_at.is_some());

    let pages = controller.page_reports(job_id).unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| p.status == Some(200)));
    let home = pages.iter().find(|p| p.depth == 0).unwrap();
    assert_eq!(home.title.as_deref(), Some("Home page of Acme"));

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(events.first(), Some(CrawlEvent::JobStarted { .. })));
    assert!(matches!(
        events.last(),
        Some(CrawlEvent::JobFinished {
            status: JobStatus::Completed,
            error: None,
            ..
        })
    ));
    let page_events = events
        .iter()
        .filter(|e| matches!(e, CrawlEvent::Page { .. }))
        .count();
    assert_eq!(page_events, 3);
    let progress: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            CrawlEvent::Progress { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 3);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_robots_disallowed_page_is_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/private", "/public"]), 1).await;
    mount_page(&server, "/public", html_page("Public page", &[]), 1).await;
    mount_page(&server, "/private", html_page("Private page", &[]), 0).await;

    let harness = Harness::new();
    let controller = harness.controller();
    let running = controller
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap();
    let job_id = running.job_id();
    let summary = running.wait().await.unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.crawled, 2);
    assert_eq!(summary.skipped, 1);

    let private = format!("{}/private", server.uri());
    let entry = with_storage(&harness.storage, |s| s.get_entry_by_url(PROJECT, &private))
        .unwrap()
        .unwrap();
    assert_eq!(entry.state, UrlState::Skipped);
    assert_eq!(entry.skip_reason, Some(SkipReason::RobotsDisallowed));
    assert_eq!(controller.job_status(job_id).unwrap().counters.skipped, 1);
}

#[tokio::test]
async fn test_ignoring_robots_fetches_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /\n"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/", html_page("Home page of Acme", &[]), 1).await;

    let harness = Harness::new();
    let options = CrawlOptions {
        respect_robots_txt: Some(false),
        ..Default::default()
    };
    let summary = harness
        .controller()
        .start_crawl(PROJECT, &base_url(&server), options, TriggerSource::Api)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.crawled, 1);
}

#[tokio::test]
async fn test_max_depth_one_never_fetches_depth_two() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/l1"]), 1).await;
    mount_page(&server, "/l1", html_page("Level one page", &["/l2"]), 1).await;
    mount_page(&server, "/l2", html_page("Level two page", &[]), 0).await;

    let harness = Harness::new();
    let options = CrawlOptions {
        max_depth: Some(1),
        ..Default::default()
    };
    let summary = harness
        .controller()
        .start_crawl(PROJECT, &base_url(&server), options, TriggerSource::Manual)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.crawled, 2);

    let deep = format!("{}/l2", server.uri());
    let entry =
        with_storage(&harness.storage, |s| s.get_entry_by_url(PROJECT, &deep)).unwrap();
    assert!(entry.is_none());
}

#[tokio::test]
async fn test_page_budget_bounds_fetches() {
    let server = MockServer::start().await;
    let links: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home page of Acme", &link_refs), 1).await;
    Mock::given(method("GET"))
        .respond_with(html_page("Leaf page of Acme", &[]))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let controller = harness.controller();
    let options = CrawlOptions {
        max_pages: Some(3),
        respect_robots_txt: Some(false),
        ..Default::default()
    };
    let running = controller
        .start_crawl(PROJECT, &base_url(&server), options, TriggerSource::Manual)
        .await
        .unwrap();
    let job_id = running.job_id();
    let summary = running.wait().await.unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(page_requests(&server).await.len(), 3);

    let job = controller.job_status(job_id).unwrap();
    assert_eq!(job.counters.crawled + job.counters.failed + job.counters.skipped, 3);
    assert_eq!(job.counters.discovered, 11);
    assert_eq!(job.progress, 100.0);

    // The rest of the frontier is closed out as over budget
    assert_eq!(summary.crawled, 3);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.unclaimed, 8);
    let leftover = format!("{}/p9", server.uri());
    let entry = with_storage(&harness.storage, |s| s.get_entry_by_url(PROJECT, &leftover))
        .unwrap()
        .unwrap();
    if entry.state == UrlState::Skipped {
        assert_eq!(entry.skip_reason, Some(SkipReason::BudgetExceeded));
    }
}

#[tokio::test]
async fn test_http_errors_fail_pages_not_the_job() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/missing", "/ok"]), 1).await;
    mount_page(&server, "/missing", ResponseTemplate::new(404), 1).await;
    mount_page(&server, "/ok", html_page("A page that works", &[]), 1).await;

    let harness = Harness::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = harness.controller().with_events(tx);
    let summary = controller
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.crawled, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.error_message.is_none());
    assert_eq!(summary.issues_by_type.get("http_error"), Some(&1));

    let mut errors = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::Error { url, message, .. } = event {
            errors.push((url, message));
        }
    }
    assert_eq!(errors.len(), 1);
    assert!(errors[0].0.ends_with("/missing"));
    assert_eq!(errors[0].1, "HTTP 404");
}

#[tokio::test]
async fn test_timeout_fails_page_without_retry() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/slow"]), 1).await;
    mount_page(
        &server,
        "/slow",
        html_page("Slow page", &[]).set_delay(Duration::from_millis(1500)),
        1,
    )
    .await;

    let harness = Harness::with_config(|c| c.job.timeout = 300);
    let summary = harness
        .controller()
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.crawled, 1);
    assert_eq!(summary.failed, 1);

    let slow = format!("{}/slow", server.uri());
    let entry = with_storage(&harness.storage, |s| s.get_entry_by_url(PROJECT, &slow))
        .unwrap()
        .unwrap();
    assert_eq!(entry.state, UrlState::Failed);
    assert!(entry.http_status.is_none());
    assert!(entry.last_error.unwrap().contains("timeout"));
}

#[tokio::test]
async fn test_recrawl_keeps_one_entry_per_url() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/a"]), 2).await;
    mount_page(&server, "/a", html_page("Page A of Acme", &["/"]), 2).await;

    let harness = Harness::new();
    let controller = harness.controller();
    let home = base_url(&server);

    let first = controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await
        .unwrap();
    let first_id = first.job_id();
    first.wait().await.unwrap();

    let hash_before = with_storage(&harness.storage, |s| s.get_content(PROJECT, &home))
        .unwrap()
        .unwrap()
        .content_hash;

    let second = controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Scheduled)
        .await
        .unwrap();
    let second_id = second.job_id();
    let summary = second.wait().await.unwrap();

    assert_ne!(first_id, second_id);
    assert_eq!(summary.crawled, 2);
    assert_eq!(controller.job_status(second_id).unwrap().counters.discovered, 2);

    let entry = with_storage(&harness.storage, |s| s.get_entry_by_url(PROJECT, &home))
        .unwrap()
        .unwrap();
    assert_eq!(entry.last_crawl_job_id, Some(second_id));
    assert_eq!(entry.content_hash.as_deref(), Some(hash_before.as_str()));

    let content = with_storage(&harness.storage, |s| s.get_content(PROJECT, &home))
        .unwrap()
        .unwrap();
    assert_eq!(content.content_hash, hash_before);

    // Both jobs keep their own counters on the job row
    assert_eq!(controller.job_status(first_id).unwrap().counters.crawled, 2);
    assert_eq!(controller.recent_jobs(PROJECT, 10).unwrap().len(), 2);
}

#[tokio::test]
async fn test_recrawl_keeps_earlier_job_report() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/a"]), 2).await;
    mount_page(&server, "/a", html_page("Page A of Acme", &["/"]), 2).await;

    let harness = Harness::new();
    let controller = harness.controller();
    let home = base_url(&server);

    let first = controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await
        .unwrap();
    let first_id = first.job_id();
    let first_summary = first.wait().await.unwrap();

    controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Scheduled)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    // Every URL now belongs to the second job, yet the first still reports its own crawl
    let summary = controller.summary(first_id).unwrap();
    assert_eq!(summary.job_id, first_id);
    assert_eq!(summary.total_pages, 2);
    assert_eq!(summary.crawled, 2);
    assert_eq!(summary.crawled, first_summary.crawled);

    let pages = controller.page_reports(first_id).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| p.state == UrlState::Crawled));

    let report = controller.report(first_id).unwrap();
    assert_eq!(report.summary.issues_by_type, first_summary.issues_by_type);
}

#[tokio::test]
async fn test_slow_fetch_keeps_its_lease() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/a", "/b", "/c"]), 1).await;
    mount_page(&server, "/a", html_page("Page A of Acme", &[]), 1).await;
    mount_page(&server, "/b", html_page("Page B of Acme", &[]), 1).await;
    mount_page(&server, "/c", html_page("Page C of Acme", &[]), 1).await;

    // /c waits two request delays for its slot, well past a one second lease
    let harness = Harness::with_config(|c| {
        c.crawler.lease_timeout = 1;
        c.crawler.poll_interval = 50;
        c.job.timeout = 900;
        c.job.request_delay = 700;
        c.job.respect_robots_txt = false;
    });
    let controller = harness.controller();
    let running = controller
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap();
    let job_id = running.job_id();
    let summary = running.wait().await.unwrap();

    assert_eq!(summary.status, JobStatus::Completed);
    assert_eq!(summary.crawled, 4);

    let mut requests = page_requests(&server).await;
    requests.sort();
    assert_eq!(requests, vec!["/", "/a", "/b", "/c"]);
    assert_eq!(controller.job_status(job_id).unwrap().counters.crawled, 4);
}

#[tokio::test]
async fn test_store_write_failure_fails_job() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home page of Acme", &[]).set_delay(Duration::from_millis(500)),
        1,
    )
    .await;

    let harness = Harness::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = harness.controller().with_events(tx);
    let running = controller
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap();
    let job_id = running.job_id();

    // Content writes start failing while the first fetch is still in flight
    let conn = rusqlite::Connection::open(&harness.db_path).unwrap();
    conn.busy_timeout(Duration::from_secs(5)).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER fail_content BEFORE INSERT ON page_content
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .unwrap();

    let summary = running.wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Failed);
    let message = summary.error_message.unwrap();
    assert!(message.starts_with("Store unavailable"), "{}", message);
    assert!(message.contains("disk full"), "{}", message);

    let job = controller.job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error_message.is_some());
    assert!(job.completed_at.is_some());

    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::JobFinished { status, error, .. } = event {
            finished = Some((status, error));
        }
    }
    let (status, error) = finished.unwrap();
    assert_eq!(status, JobStatus::Failed);
    assert!(error.is_some());
}

#[tokio::test]
async fn test_changed_title_changes_stored_hash() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Original title here", &[]), 1).await;

    let harness = Harness::new();
    let controller = harness.controller();
    let home = base_url(&server);

    controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    let before = with_storage(&harness.storage, |s| s.get_content(PROJECT, &home))
        .unwrap()
        .unwrap();

    server.reset().await;
    mount_page(&server, "/", html_page("A brand new title", &[]), 1).await;

    controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    let after = with_storage(&harness.storage, |s| s.get_content(PROJECT, &home))
        .unwrap()
        .unwrap();

    assert_ne!(before.content_hash, after.content_hash);
    assert_eq!(after.title.as_deref(), Some("A brand new title"));
}

#[tokio::test]
async fn test_stop_cancels_job() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home page of Acme", &["/a", "/b"]).set_delay(Duration::from_millis(300)),
        0..=1,
    )
    .await;
    mount_page(&server, "/a", html_page("Page A of Acme", &[]), 0).await;
    mount_page(&server, "/b", html_page("Page B of Acme", &[]), 0).await;

    let harness = Harness::new();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = harness.controller().with_events(tx);
    let running = controller
        .start_crawl(
            PROJECT,
            &base_url(&server),
            CrawlOptions::default(),
            TriggerSource::Manual,
        )
        .await
        .unwrap();
    let job_id = running.job_id();
    assert!(controller.stop_crawl(job_id).await);

    let summary = running.wait().await.unwrap();
    assert_eq!(summary.status, JobStatus::Cancelled);
    assert!(summary.crawled <= 1);

    let job = controller.job_status(job_id).unwrap();
    assert_eq!(job.status, JobStatus::Cancelled);
    assert!(job.error_message.is_none());
    assert!(!controller.stop_crawl(job_id).await);

    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        if let CrawlEvent::JobFinished { status, .. } = event {
            finished = Some(status);
        }
    }
    assert_eq!(finished, Some(JobStatus::Cancelled));
}

#[tokio::test]
async fn test_second_start_for_project_is_rejected() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        html_page("Home page of Acme", &[]).set_delay(Duration::from_millis(300)),
        1,
    )
    .await;

    let harness = Harness::new();
    let controller = harness.controller();
    let home = base_url(&server);

    let running = controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await
        .unwrap();

    let second = controller
        .start_crawl(PROJECT, &home, CrawlOptions::default(), TriggerSource::Manual)
        .await;
    match second {
        Err(CrawlError::JobAlreadyRunning { project_id, job_id }) => {
            assert_eq!(project_id, PROJECT);
            assert_eq!(job_id, running.job_id());
        }
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("second crawl should be rejected"),
    }

    running.wait().await.unwrap();
    assert!(controller.running_jobs().await.is_empty());
}

#[tokio::test]
async fn test_report_written_to_output_file() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home page of Acme", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("Page A of Acme", &[]), 1).await;

    let harness = Harness::new();
    let out_dir = TempDir::new().unwrap();
    let report_path = out_dir.path().join("report.json");
    let options = CrawlOptions {
        output_file: Some(report_path.display().to_string()),
        ..Default::default()
    };

    harness
        .controller()
        .start_crawl(PROJECT, &base_url(&server), options, TriggerSource::Manual)
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["summary"]["status"], "completed");
    assert_eq!(json["summary"]["crawled"], 2);
    assert_eq!(json["pages"].as_array().unwrap().len(), 2);
}
