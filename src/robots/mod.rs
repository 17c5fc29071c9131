//! Robots.txt handling module
//!
//! Fetches, parses and caches robots.txt per origin. Missing or unreachable
//! robots files allow everything.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::ParsedRobots;

use tracing::{debug, warn};
use url::Url;

/// Fetches robots.txt for the origin of `url`
///
/// Any non-success status or transport error yields an allow-all result;
/// robots.txt never fails a crawl.
pub async fn fetch_robots(client: &reqwest::Client, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return ParsedRobots::allow_all(),
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            warn!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        debug!(
            "No robots.txt at {} (HTTP {}), allowing all",
            robots_url,
            response.status().as_u16()
        );
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => ParsedRobots::from_content(&body),
        Err(e) => {
            warn!("Failed to read {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
