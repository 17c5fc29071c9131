//! HTML extraction
//!
//! Pulls the fields the audit needs out of a fetched document:
//! - title, meta description, canonical link
//! - headings `h1`..`h6`
//! - visible body text and its word count
//! - outgoing `<a href>` links with anchor text and `nofollow`
//! - images with their `alt` text
//! - JSON-LD structured data blocks

use crate::content::{Heading, Image, Link, NormalizedContent, RenderMode};
use crate::url::is_same_site;
use scraper::{node::Node, ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never counts as page copy
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts normalized content from an HTML document
///
/// Relative links and image sources are resolved against `page_url`. A link
/// is internal when it shares a registrable domain with `site_url`.
///
/// Fetch metadata (status, timings, hash) is left zeroed for the caller to
/// fill in.
///
/// # Example
///
/// ```
/// use seo_crawler::content::extract_content;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page = Url::parse("https://example.com/").unwrap();
/// let content = extract_content(html, &page, &page);
/// assert_eq!(content.title.as_deref(), Some("Test"));
/// assert_eq!(content.links[0].href, "https://example.com/page");
/// ```
pub fn extract_content(html: &str, page_url: &Url, site_url: &Url) -> NormalizedContent {
    let document = Html::parse_document(html);

    let body_text = extract_body_text(&document);
    let word_count = body_text.split_whitespace().count() as u32;

    NormalizedContent {
        title: extract_title(&document),
        meta_description: extract_meta_description(&document),
        canonical_url: extract_canonical(&document, page_url),
        headings: extract_headings(&document),
        body_text,
        word_count,
        links: extract_links(&document, page_url, site_url),
        images: extract_images(&document, page_url),
        structured_data: extract_structured_data(&document),
        content_hash: String::new(),
        raw_html: None,
        render_mode: RenderMode::Static,
        http_status: 0,
        response_time_ms: 0,
        body_bytes: 0,
    }
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should not be followed:
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - fragment-only links (same page anchors)
/// - hrefs that fail to resolve or resolve to a non-HTTP(S) URL
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .filter(|u| u.scheme() == "http" || u.scheme() == "https")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn extract_meta_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&selector)
        .find(|e| {
            e.value()
                .attr("name")
                .is_some_and(|n| n.eq_ignore_ascii_case("description"))
        })
        .and_then(|e| e.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

fn extract_canonical(document: &Html, page_url: &Url) -> Option<String> {
    let selector = Selector::parse("link[rel][href]").ok()?;

    document
        .select(&selector)
        .find(|e| {
            e.value()
                .attr("rel")
                .is_some_and(|r| r.eq_ignore_ascii_case("canonical"))
        })
        .and_then(|e| e.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .map(|u| u.to_string())
}

fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse("h1, h2, h3, h4, h5, h6") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|e| {
            let level = e.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            let text = element_text(e);
            (!text.is_empty()).then_some(Heading { level, text })
        })
        .collect()
}

/// Collects visible text from `<body>`, skipping script-like elements
fn extract_body_text(document: &Html) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|s| document.select(&s).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| NON_CONTENT_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    collapse_whitespace(&parts.join(" "))
}

fn extract_links(document: &Html, page_url: &Url, site_url: &Url) -> Vec<Link> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for element in document.select(&a_selector) {
        // Download links point at files, not pages
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(resolved) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, page_url))
        else {
            continue;
        };

        let nofollow = element
            .value()
            .attr("rel")
            .is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|r| r.eq_ignore_ascii_case("nofollow"))
            });

        links.push(Link {
            internal: is_same_site(&resolved, site_url),
            href: resolved.to_string(),
            anchor_text: element_text(element),
            nofollow,
        });
    }

    links
}

fn extract_images(document: &Html, page_url: &Url) -> Vec<Image> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|e| {
            let src = e.value().attr("src")?.trim();
            if src.is_empty() {
                return None;
            }
            let src = page_url
                .join(src)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| src.to_string());
            Some(Image {
                src,
                alt: e.value().attr("alt").map(|a| a.trim().to_string()),
            })
        })
        .collect()
}

fn extract_structured_data(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("script[type]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|e| {
            e.value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
