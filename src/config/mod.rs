//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and building the per-job `CrawlJobConfig` value object.
//!
//! # Example
//!
//! ```no_run
//! use seo_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl.toml")).unwrap();
//! println!("Fetch pool size: {}", config.crawler.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlJobConfig, CrawlOptions, CrawlerConfig, JobDefaults, OutputConfig,
    ProjectConfig, UserAgentConfig,
};

// Re-export parser and validation functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate_base_url, validate_job_config, validate_lease_covers_fetch};
