//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Building job summaries and per-page reports from the store
//! - Rendering them as JSON or markdown
//! - Printing job status to the console

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_report, format_markdown_summary};
pub use stats::{print_job_status, print_summary};
pub use summary::{
    build_report, finalize_report, load_report, load_summary, page_reports, CrawlReport,
    CrawlResultSummary, PageReport,
};

use crate::CrawlError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a report to `output_path`
///
/// Paths ending in `.md` get markdown; anything else gets pretty JSON.
pub fn write_report(report: &CrawlReport, output_path: &Path) -> Result<(), CrawlError> {
    let is_markdown = output_path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));

    let rendered = if is_markdown {
        format_markdown_report(report)
    } else {
        serde_json::to_string_pretty(report)?
    };

    let mut file = File::create(output_path)?;
    file.write_all(rendered.as_bytes())?;

    tracing::info!("Wrote crawl report to {}", output_path.display());
    Ok(())
}
