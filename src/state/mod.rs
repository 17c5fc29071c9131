//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: lifecycle of a URL inventory entry (discovered, queued, crawled, ...)
//! - `SkipReason`: why an entry was skipped without a fetch
//! - `JobStatus`: lifecycle of a crawl job
//! - `TriggerSource`: what started a crawl job

mod job_state;
mod page_state;

// Re-export main types
pub use job_state::{JobStatus, TriggerSource};
pub use page_state::{SkipReason, UrlState};
