//! URL handling module
//!
//! This module provides URL normalization, registrable-domain lookup, include/exclude
//! pattern matching, and internal/external link classification.

mod domain;
mod matcher;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::{is_same_site, registrable_domain};
pub use matcher::{matches_pattern, UrlFilter};
pub use normalize::{normalize_url, url_key};

/// Where a link points relative to the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkScope {
    /// Same registrable domain as the crawl's base URL
    Internal,
    /// Any other site
    External,
}

impl LinkScope {
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Classifies a link as internal or external to the site rooted at `base`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_crawler::url::{classify_link, LinkScope};
///
/// let base = Url::parse("https://www.example.com/").unwrap();
/// let link = Url::parse("https://blog.example.com/post").unwrap();
/// assert_eq!(classify_link(&link, &base), LinkScope::Internal);
/// ```
pub fn classify_link(link: &Url, base: &Url) -> LinkScope {
    if is_same_site(link, base) {
        LinkScope::Internal
    } else {
        LinkScope::External
    }
}
