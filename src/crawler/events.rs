//! Outbound crawl events
//!
//! Events go out on one unbounded `mpsc` channel, unthrottled. A closed
//! receiver is ignored: events are advisory and never block the crawl.

use crate::state::{JobStatus, UrlState};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Event emitted by a running crawl job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    JobStarted {
        job_id: i64,
        project_id: String,
        base_url: String,
    },

    /// Emitted after every completed page
    Progress {
        job_id: i64,
        crawled_pages: u64,
        total_pages: u64,
        pages_per_minute: f64,
        progress: f64,
    },

    Page {
        job_id: i64,
        url: String,
        status: Option<u16>,
        state: UrlState,
        depth: u32,
        response_time_ms: Option<u64>,
    },

    /// A page failed (its entry is `failed`; the job keeps going)
    Error {
        job_id: i64,
        url: String,
        message: String,
    },

    JobFinished {
        job_id: i64,
        status: JobStatus,
        error: Option<String>,
    },
}

impl CrawlEvent {
    pub fn job_id(&self) -> i64 {
        match self {
            Self::JobStarted { job_id, .. }
            | Self::Progress { job_id, .. }
            | Self::Page { job_id, .. }
            | Self::Error { job_id, .. }
            | Self::JobFinished { job_id, .. } => *job_id,
        }
    }
}

/// Sends an event if anyone is listening
pub(crate) fn emit(events: &Option<UnboundedSender<CrawlEvent>>, event: CrawlEvent) {
    if let Some(tx) = events {
        if tx.send(event).is_err() {
            tracing::trace!("Event receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_type_tag() {
        let event = CrawlEvent::Page {
            job_id: 7,
            url: "https://example.com/".to_string(),
            status: Some(200),
            state: UrlState::Crawled,
            depth: 0,
            response_time_ms: Some(12),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "page");
        assert_eq!(json["state"], "crawled");
        assert_eq!(json["status"], 200);
    }

    #[test]
    fn test_job_finished_serialization() {
        let event = CrawlEvent::JobFinished {
            job_id: 1,
            status: JobStatus::Cancelled,
            error: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "job_finished");
        assert_eq!(json["status"], "cancelled");
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_emit_without_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        // Must not panic
        emit(
            &Some(tx),
            CrawlEvent::Error {
                job_id: 1,
                url: "https://example.com/".to_string(),
                message: "HTTP 500".to_string(),
            },
        );
        emit(
            &None,
            CrawlEvent::JobFinished {
                job_id: 1,
                status: JobStatus::Completed,
                error: None,
            },
        );
    }
}
