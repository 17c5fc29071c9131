//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the job's user agent
//! - GET requests bounded by a hard timeout
//! - Content-Type classification (HTML or not)
//! - Error classification

use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: String,
        status_code: u16,
        content_type: String,
        body: String,
        response_time_ms: u64,
    },

    /// 2xx response that is not HTML
    NotHtml {
        status_code: u16,
        content_type: String,
        response_time_ms: u64,
    },

    /// 4xx or 5xx response
    HttpError {
        status_code: u16,
        response_time_ms: u64,
    },

    /// The whole fetch (headers and body) exceeded the timeout
    Timeout { response_time_ms: u64 },

    /// Connection, TLS, redirect or body read failure
    NetworkError { error: String },
}

impl FetchResult {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success { status_code, .. }
            | Self::NotHtml { status_code, .. }
            | Self::HttpError { status_code, .. } => Some(*status_code),
            Self::Timeout { .. } | Self::NetworkError { .. } => None,
        }
    }

    pub fn response_time_ms(&self) -> Option<u64> {
        match self {
            Self::Success {
                response_time_ms, ..
            }
            | Self::NotHtml {
                response_time_ms, ..
            }
            | Self::HttpError {
                response_time_ms, ..
            }
            | Self::Timeout { response_time_ms } => Some(*response_time_ms),
            Self::NetworkError { .. } => None,
        }
    }
}

/// Builds an HTTP client for a crawl job
///
/// # Arguments
///
/// * `user_agent` - Full User-Agent header value
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```
/// use seo_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("SeoCrawler/1.0", Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for Content-Type values that carry an HTML document
///
/// A missing header is treated as HTML.
pub fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Fetches a URL once, with `timeout` bounding headers and body together
///
/// There are no retries: a timeout or transport error is final for this
/// job.
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx HTML | `Success` |
/// | 2xx other | `NotHtml` |
/// | 4xx / 5xx | `HttpError` |
/// | Deadline hit | `Timeout` |
/// | Connection, TLS, redirect loop | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> FetchResult {
    let start = Instant::now();

    match tokio::time::timeout(timeout, fetch_inner(client, url, timeout, start)).await {
        Ok(result) => result,
        Err(_) => FetchResult::Timeout {
            response_time_ms: elapsed_ms(start),
        },
    }
}

async fn fetch_inner(client: &Client, url: &str, timeout: Duration, start: Instant) -> FetchResult {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => return classify_error(e, start),
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if status.is_client_error() || status.is_server_error() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
            response_time_ms: elapsed_ms(start),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::NotHtml {
            status_code: status.as_u16(),
            content_type,
            response_time_ms: elapsed_ms(start),
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            response_time_ms: elapsed_ms(start),
        },
        Err(e) => classify_error(e, start),
    }
}

fn classify_error(e: reqwest::Error, start: Instant) -> FetchResult {
    if e.is_timeout() {
        FetchResult::Timeout {
            response_time_ms: elapsed_ms(start),
        }
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("Connection failed: {}", e),
        }
    } else if e.is_redirect() {
        FetchResult::NetworkError {
            error: format!("Redirect error: {}", e),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
