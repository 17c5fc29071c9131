//! Page content module
//!
//! Turns a fetched HTML document into a [`NormalizedContent`] value,
//! fingerprints it for change detection, and flags on-page SEO issues.

mod extract;
mod hash;
mod issues;

use serde::{Deserialize, Serialize};

pub use extract::{extract_content, resolve_link};
pub use hash::content_hash;
pub use issues::{detect_issues, IssueKind, SeoIssue, Severity};

/// How a page was rendered before extraction
///
/// Only static fetches are performed; the variant exists so stored records
/// say so explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Static,
}

impl RenderMode {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Static => "static",
        }
    }
}

/// A heading element (`h1`..`h6`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// An outgoing `<a href>` link, already resolved to an absolute URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub anchor_text: String,
    pub nofollow: bool,
    /// Same registrable domain as the page it was found on
    pub internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: Option<String>,
}

impl Image {
    pub fn has_alt(&self) -> bool {
        self.alt.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

/// Structured fields extracted from one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedContent {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub canonical_url: Option<String>,
    pub headings: Vec<Heading>,
    pub body_text: String,
    pub word_count: u32,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
    /// Raw JSON-LD blocks, trimmed
    pub structured_data: Vec<String>,
    /// Filled in by [`content_hash`] once extraction is done
    pub content_hash: String,
    pub raw_html: Option<String>,
    pub render_mode: RenderMode,
    pub http_status: u16,
    pub response_time_ms: u64,
    pub body_bytes: u64,
}

impl NormalizedContent {
    /// Text of the first `h1`, or of the first heading when there is no `h1`
    pub fn primary_heading(&self) -> Option<&str> {
        self.headings
            .iter()
            .find(|h| h.level == 1)
            .or_else(|| self.headings.first())
            .map(|h| h.text.as_str())
    }

    pub fn h1_count(&self) -> usize {
        self.headings.iter().filter(|h| h.level == 1).count()
    }

    pub fn internal_link_count(&self) -> usize {
        self.links.iter().filter(|l| l.internal).count()
    }

    pub fn external_link_count(&self) -> usize {
        self.links.len() - self.internal_link_count()
    }

    pub fn images_missing_alt(&self) -> usize {
        self.images.iter().filter(|i| !i.has_alt()).count()
    }
}
