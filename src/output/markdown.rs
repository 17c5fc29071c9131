//! Markdown report generation
//!
//! Renders a human-readable report of one crawl job: run information,
//! page counts, averages, the issue histograms and a page table.

use crate::output::summary::{CrawlReport, CrawlResultSummary, PageReport};

/// Rows of the page table; larger reports list the rest as a count
const MAX_PAGE_ROWS: usize = 200;

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = format_markdown_summary(&report.summary);

    if !report.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Depth | Title | Words | Time (ms) | Issues |\n");
        md.push_str("|-----|--------|-------|-------|-------|-----------|--------|\n");

        for page in report.pages.iter().take(MAX_PAGE_ROWS) {
            md.push_str(&page_row(page));
        }

        if report.pages.len() > MAX_PAGE_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.pages.len() - MAX_PAGE_ROWS
            ));
        }
        md.push('\n');
    }

    md
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlResultSummary) -> String {
    let mut md = String::new();

    md.push_str("# Crawl Summary\n\n");

    md.push_str("## Job Information\n\n");
    md.push_str(&format!("- **Job ID**: {}\n", summary.job_id));
    md.push_str(&format!("- **Project**: {}\n", summary.project_id));
    md.push_str(&format!("- **Base URL**: {}\n", summary.base_url));
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    if let Some(duration) = summary.duration_secs {
        md.push_str(&format!(
            "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
            duration,
            duration / 60.0
        ));
    }
    if let Some(error) = &summary.error_message {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Pages**: {}\n", summary.total_pages));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!(
        "- **Average Response Time**: {:.0} ms\n",
        summary.avg_response_time_ms
    ));
    md.push_str(&format!(
        "- **Average Word Count**: {:.0}\n",
        summary.avg_word_count
    ));
    md.push_str(&format!(
        "- **Links**: {} internal, {} external\n",
        summary.internal_links, summary.external_links
    ));
    md.push_str(&format!(
        "- **Images**: {} ({} missing alt text)\n",
        summary.total_images, summary.images_missing_alt
    ));
    md.push_str(&format!(
        "- **Duplicate Titles**: {}\n",
        summary.duplicate_titles
    ));
    md.push_str(&format!(
        "- **Duplicate Descriptions**: {}\n\n",
        summary.duplicate_descriptions
    ));

    md.push_str("## Page State Breakdown\n\n");
    md.push_str("| State | Count |\n");
    md.push_str("|-------|-------|\n");
    md.push_str(&format!("| Crawled | {} |\n", summary.crawled));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| Excluded | {} |\n", summary.excluded));
    md.push_str(&format!("| Unclaimed | {} |\n\n", summary.unclaimed));

    if !summary.issues_by_severity.is_empty() {
        md.push_str("## Issues by Severity\n\n");
        md.push_str("| Severity | Count |\n");
        md.push_str("|----------|-------|\n");
        for (severity, count) in &summary.issues_by_severity {
            md.push_str(&format!("| {} | {} |\n", severity, count));
        }
        md.push('\n');
    }

    if !summary.issues_by_type.is_empty() {
        md.push_str("## Issues by Type\n\n");
        md.push_str("| Issue | Pages |\n");
        md.push_str("|-------|-------|\n");

        let mut issues: Vec<_> = summary.issues_by_type.iter().collect();
        issues.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (kind, count) in issues {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');
    }

    md
}

fn page_row(page: &PageReport) -> String {
    format!(
        "| {} | {} | {} | {} | {} | {} | {} |\n",
        page.url,
        page.status.map_or("-".to_string(), |s| s.to_string()),
        page.depth,
        escape_cell(page.title.as_deref().unwrap_or("")),
        page.word_count.map_or("-".to_string(), |w| w.to_string()),
        page.response_time_ms.map_or("-".to_string(), |t| t.to_string()),
        page.issues.len()
    )
}

/// Keeps cell text from breaking the table
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
