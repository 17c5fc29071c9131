use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub project: Option<ProjectConfig>,
    #[serde(default)]
    pub job: JobDefaults,
}

/// Fetch pool configuration (shared by every job this process runs)
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Seconds a claimed frontier entry stays leased before it can be re-claimed
    #[serde(rename = "lease-timeout", default = "default_lease_timeout")]
    pub lease_timeout: u64,

    /// Milliseconds the orchestrator waits before polling an idle frontier again
    #[serde(rename = "poll-interval", default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            lease_timeout: default_lease_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler (also the robots.txt product token)
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Default report path (JSON, or Markdown when it ends in `.md`)
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Project to crawl when none is given on the command line
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    pub id: String,

    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Default job settings from the `[job]` table
#[derive(Debug, Clone, Deserialize)]
pub struct JobDefaults {
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Minimum spacing between requests across the pool (milliseconds)
    #[serde(rename = "request-delay", default = "default_request_delay")]
    pub request_delay: u64,

    /// Hard upper bound on a single fetch (milliseconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    #[serde(rename = "same-domain-only", default = "default_true")]
    pub same_domain_only: bool,

    #[serde(rename = "include-patterns", default)]
    pub include_patterns: Vec<String>,

    #[serde(rename = "exclude-patterns", default)]
    pub exclude_patterns: Vec<String>,

    #[serde(rename = "store-raw-html", default)]
    pub store_raw_html: bool,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_depth: default_max_depth(),
            request_delay: default_request_delay(),
            timeout: default_timeout(),
            respect_robots_txt: true,
            same_domain_only: true,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            store_raw_html: false,
        }
    }
}

/// Settings of one crawl job
///
/// Immutable for the job's lifetime; persisted as JSON on the job row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJobConfig {
    pub max_pages: u32,
    pub max_depth: u32,
    pub request_delay_ms: u64,
    pub timeout_ms: u64,
    pub user_agent: String,
    pub respect_robots_txt: bool,
    pub same_domain_only: bool,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub store_raw_html: bool,
}

impl CrawlJobConfig {
    /// Builds a job config from the `[job]` defaults and the user agent section
    pub fn from_defaults(defaults: &JobDefaults, user_agent: &UserAgentConfig) -> Self {
        Self {
            max_pages: defaults.max_pages,
            max_depth: defaults.max_depth,
            request_delay_ms: defaults.request_delay,
            timeout_ms: defaults.timeout,
            user_agent: user_agent.header_value(),
            respect_robots_txt: defaults.respect_robots_txt,
            same_domain_only: defaults.same_domain_only,
            include_patterns: defaults.include_patterns.clone(),
            exclude_patterns: defaults.exclude_patterns.clone(),
            store_raw_html: defaults.store_raw_html,
        }
    }

    /// The product token robots.txt groups are matched against
    ///
    /// `SeoCrawler/1.0 (+https://...)` yields `SeoCrawler`.
    pub fn robots_token(&self) -> &str {
        self.user_agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .next()
            .filter(|t| !t.is_empty())
            .unwrap_or("*")
    }
}

/// Per-crawl overrides accepted by the command surface
///
/// Unset fields keep the job defaults.
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub max_pages: Option<u32>,
    pub max_depth: Option<u32>,
    pub request_delay_ms: Option<u64>,
    pub respect_robots_txt: Option<bool>,
    pub same_domain_only: Option<bool>,
    pub output_file: Option<String>,
}

impl CrawlOptions {
    /// Applies the overrides on top of a base job config
    pub fn apply(&self, mut base: CrawlJobConfig) -> CrawlJobConfig {
        if let Some(v) = self.max_pages {
            base.max_pages = v;
        }
        if let Some(v) = self.max_depth {
            base.max_depth = v;
        }
        if let Some(v) = self.request_delay_ms {
            base.request_delay_ms = v;
        }
        if let Some(v) = self.respect_robots_txt {
            base.respect_robots_txt = v;
        }
        if let Some(v) = self.same_domain_only {
            base.same_domain_only = v;
        }
        base
    }
}

fn default_concurrency() -> u32 {
    4
}

fn default_lease_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    250
}

fn default_max_pages() -> u32 {
    100
}

fn default_max_depth() -> u32 {
    3
}

fn default_request_delay() -> u64 {
    500
}

fn default_timeout() -> u64 {
    30_000
}

fn default_true() -> bool {
    true
}
