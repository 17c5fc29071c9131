//! seo-crawler main entry point
//!
//! This is the command-line interface for the crawl engine.

use clap::Parser;
use seo_crawler::config::{
    load_config_with_hash, validate_base_url, validate_job_config, Config, CrawlJobConfig,
    CrawlOptions,
};
use seo_crawler::crawler::JobController;
use seo_crawler::output::{print_job_status, print_summary, write_report};
use seo_crawler::state::TriggerSource;
use seo_crawler::storage::{open_storage, shared};
use seo_crawler::CrawlEvent;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// seo-crawler: site crawl engine for SEO audits
///
/// Crawls a website under a page and depth budget, respecting robots.txt,
/// keeps a per-project URL inventory, and reports on-page issues.
#[derive(Parser, Debug)]
#[command(name = "seo-crawler")]
#[command(version)]
#[command(about = "Site crawl engine for SEO audits", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Project to crawl (defaults to [project] id)
    #[arg(long)]
    project_id: Option<String>,

    /// URL the crawl starts from (defaults to [project] base-url)
    #[arg(long)]
    base_url: Option<String>,

    /// Page budget for this crawl
    #[arg(long)]
    max_pages: Option<u32>,

    /// Maximum link depth from the base URL
    #[arg(long)]
    max_depth: Option<u32>,

    /// Minimum milliseconds between requests
    #[arg(long, value_name = "MS")]
    request_delay: Option<u64>,

    /// Ignore robots.txt
    #[arg(long)]
    no_robots: bool,

    /// Follow links to other sites too
    #[arg(long)]
    allow_external: bool,

    /// Write the report here (.md for markdown, JSON otherwise)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["status", "summary"])]
    dry_run: bool,

    /// Show a job's status and exit
    #[arg(long, value_name = "JOB_ID", conflicts_with_all = ["dry_run", "summary"])]
    status: Option<i64>,

    /// Show a job's summary and exit (written to --output if given)
    #[arg(long, value_name = "JOB_ID", conflicts_with_all = ["dry_run", "status"])]
    summary: Option<i64>,
}

impl Cli {
    fn crawl_options(&self, config: &Config) -> CrawlOptions {
        let output_file = self
            .output
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| config.output.summary_path.clone());

        CrawlOptions {
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            request_delay_ms: self.request_delay,
            respect_robots_txt: self.no_robots.then_some(false),
            same_domain_only: self.allow_external.then_some(false),
            output_file,
        }
    }

    /// Project ID and base URL from the flags, falling back to `[project]`
    fn target(&self, config: &Config) -> Result<(String, String), Box<dyn std::error::Error>> {
        let project_id = self
            .project_id
            .clone()
            .or_else(|| config.project.as_ref().map(|p| p.id.clone()));
        let base_url = self
            .base_url
            .clone()
            .or_else(|| config.project.as_ref().map(|p| p.base_url.clone()));

        match (project_id, base_url) {
            (Some(id), Some(url)) => Ok((id, url)),
            _ => Err("no project to crawl: pass --project-id and --base-url or set [project]".into()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&cli, &config)?;
    } else if let Some(job_id) = cli.status {
        handle_status(&config, job_id)?;
    } else if let Some(job_id) = cli.summary {
        handle_summary(&config, job_id, cli.output.as_deref())?;
    } else {
        handle_crawl(&cli, &config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_crawler=info,warn"),
            1 => EnvFilter::new("seo_crawler=debug,info"),
            2 => EnvFilter::new("seo_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(cli: &Cli, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let (project_id, base_url) = cli.target(config)?;
    let base = validate_base_url(&base_url)?;
    let job = cli
        .crawl_options(config)
        .apply(CrawlJobConfig::from_defaults(&config.job, &config.user_agent));
    validate_job_config(&job)?;

    println!("=== seo-crawler Dry Run ===\n");

    println!("Fetch Pool:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Lease timeout: {}s", config.crawler.lease_timeout);
    println!("  Poll interval: {}ms", config.crawler.poll_interval);

    println!("\nTarget:");
    println!("  Project: {}", project_id);
    println!("  Base URL: {}", base);

    println!("\nJob:");
    println!("  Max pages: {}", job.max_pages);
    println!("  Max depth: {}", job.max_depth);
    println!("  Request delay: {}ms", job.request_delay_ms);
    println!("  Timeout: {}ms", job.timeout_ms);
    println!("  User agent: {}", job.user_agent);
    println!("  Respect robots.txt: {}", job.respect_robots_txt);
    println!("  Same domain only: {}", job.same_domain_only);
    println!("  Store raw HTML: {}", job.store_raw_html);
    if !job.include_patterns.is_empty() {
        println!("  Include: {}", job.include_patterns.join(", "));
    }
    if !job.exclude_patterns.is_empty() {
        println!("  Exclude: {}", job.exclude_patterns.join(", "));
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(path) = cli.crawl_options(config).output_file {
        println!("  Report: {}", path);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl up to {} pages from {}", job.max_pages, base);

    Ok(())
}

/// Handles the --status mode: prints one job's status
fn handle_status(config: &Config, job_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let storage = shared(open_storage(Path::new(&config.output.database_path))?);
    let controller = JobController::new(storage, config);

    let job = controller.job_status(job_id)?;
    print_job_status(&job);

    Ok(())
}

/// Handles the --summary mode: prints (and optionally writes) a job's report
fn handle_summary(
    config: &Config,
    job_id: i64,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = shared(open_storage(Path::new(&config.output.database_path))?);
    let controller = JobController::new(storage, config);

    let report = controller.report(job_id)?;
    print_summary(&report.summary);

    if let Some(path) = output {
        write_report(&report, path)?;
        println!("✓ Report written to: {}", path.display());
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    cli: &Cli,
    config: &Config,
    config_hash: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let (project_id, base_url) = cli.target(config)?;
    let options = cli.crawl_options(config);
    let output_file = options.output_file.clone();

    let storage = shared(open_storage(Path::new(&config.output.database_path))?);
    let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
    let controller = JobController::new(storage, config)
        .with_events(events_tx)
        .with_config_hash(config_hash);

    let quiet = cli.quiet;
    let printer = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if !quiet {
                print_event(&event);
            }
        }
    });

    let running = controller
        .start_crawl(&project_id, &base_url, options, TriggerSource::Manual)
        .await?;

    // Ctrl-C asks for a graceful stop; the job ends as cancelled
    let stop = running.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            stop.stop();
        }
    });

    let result = running.wait().await;

    // Dropping the controller closes the event channel
    drop(controller);
    if let Err(e) = printer.await {
        tracing::warn!("Event printer failed: {}", e);
    }

    match result {
        Ok(summary) => {
            println!();
            print_summary(&summary);
            if let Some(path) = output_file {
                println!("✓ Report written to: {}", path);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::JobStarted {
            job_id, base_url, ..
        } => println!("Started crawl job {} at {}", job_id, base_url),
        CrawlEvent::Page {
            url,
            status,
            state,
            depth,
            response_time_ms,
            ..
        } => println!(
            "  [{}] {} {} (depth {}, {})",
            state,
            status.map_or("---".to_string(), |s| s.to_string()),
            url,
            depth,
            response_time_ms.map_or("-".to_string(), |t| format!("{}ms", t))
        ),
        CrawlEvent::Progress {
            crawled_pages,
            total_pages,
            pages_per_minute,
            progress,
            ..
        } => tracing::debug!(
            "{:.0}% ({} of {} pages, {:.1}/min)",
            progress,
            crawled_pages,
            total_pages,
            pages_per_minute
        ),
        CrawlEvent::Error { url, message, .. } => println!("  ✗ {}: {}", url, message),
        CrawlEvent::JobFinished { job_id, status, .. } => {
            println!("Crawl job {} {}", job_id, status)
        }
    }
}
