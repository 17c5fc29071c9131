//! Console output for job status and summaries

use crate::output::summary::CrawlResultSummary;
use crate::storage::JobRecord;

/// Prints a job's status and counters to stdout
pub fn print_job_status(job: &JobRecord) {
    println!("=== Crawl Job {} ===\n", job.id);

    println!("Overview:");
    println!("  Project: {}", job.project_id);
    println!("  Base URL: {}", job.base_url);
    println!("  Status: {}", job.status);
    println!("  Trigger: {}", job.trigger.to_db_string());
    println!("  Progress: {:.1}%", job.progress);
    println!();

    println!("Pages:");
    println!("  Discovered: {}", job.counters.discovered);
    println!("  Crawled: {}", job.counters.crawled);
    println!("  Failed: {}", job.counters.failed);
    println!("  Skipped: {}", job.counters.skipped);
    println!();

    println!("Timeline:");
    println!("  Created: {}", job.created_at);
    if let Some(started) = &job.started_at {
        println!("  Started: {}", started);
    }
    if let Some(completed) = &job.completed_at {
        println!("  Completed: {}", completed);
    }

    if let Some(error) = &job.error_message {
        println!();
        println!("Error: {}", error);
    }
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlResultSummary) {
    println!("=== Crawl Summary (job {}) ===\n", summary.job_id);

    println!("Overview:");
    println!("  Base URL: {}", summary.base_url);
    println!("  Status: {}", summary.status);
    if let Some(duration) = summary.duration_secs {
        println!("  Duration: {:.1}s", duration);
    }
    println!("  Total pages: {}", summary.total_pages);
    println!(
        "  Crawled / failed / skipped: {} / {} / {}",
        summary.crawled, summary.failed, summary.skipped
    );
    println!(
        "  Excluded by pattern: {}, left unclaimed: {}",
        summary.excluded, summary.unclaimed
    );
    println!("  Avg response time: {:.0} ms", summary.avg_response_time_ms);
    println!("  Avg word count: {:.0}", summary.avg_word_count);
    println!(
        "  Links: {} internal, {} external",
        summary.internal_links, summary.external_links
    );
    println!(
        "  Images: {} ({} missing alt)",
        summary.total_images, summary.images_missing_alt
    );
    println!(
        "  Duplicate titles / descriptions: {} / {}",
        summary.duplicate_titles, summary.duplicate_descriptions
    );
    println!();

    if !summary.issues_by_type.is_empty() {
        println!("Issues ({} total):", summary.total_issues());
        // Sort issue types by count (descending)
        let mut issues: Vec<_> = summary.issues_by_type.iter().collect();
        issues.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in issues {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if let Some(error) = &summary.error_message {
        println!("Error: {}", error);
    }
}
