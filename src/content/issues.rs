//! On-page SEO issue detection

use crate::content::NormalizedContent;
use serde::{Deserialize, Serialize};
use std::fmt;

const TITLE_MAX_CHARS: usize = 60;
const TITLE_MIN_CHARS: usize = 10;
const DESCRIPTION_MAX_CHARS: usize = 160;
const THIN_CONTENT_WORDS: u32 = 300;
const SLOW_RESPONSE_MS: u64 = 3000;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Notice,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingTitle,
    TitleTooLong,
    TitleTooShort,
    MissingMetaDescription,
    MetaDescriptionTooLong,
    MissingH1,
    MultipleH1,
    ThinContent,
    ImagesMissingAlt,
    HttpError,
    SlowResponse,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingTitle => "missing_title",
            Self::TitleTooLong => "title_too_long",
            Self::TitleTooShort => "title_too_short",
            Self::MissingMetaDescription => "missing_meta_description",
            Self::MetaDescriptionTooLong => "meta_description_too_long",
            Self::MissingH1 => "missing_h1",
            Self::MultipleH1 => "multiple_h1",
            Self::ThinContent => "thin_content",
            Self::ImagesMissingAlt => "images_missing_alt",
            Self::HttpError => "http_error",
            Self::SlowResponse => "slow_response",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingTitle | Self::HttpError => Severity::Error,
            Self::MissingMetaDescription
            | Self::MissingH1
            | Self::TitleTooLong
            | Self::ImagesMissingAlt
            | Self::SlowResponse => Severity::Warning,
            Self::TitleTooShort
            | Self::MetaDescriptionTooLong
            | Self::MultipleH1
            | Self::ThinContent => Severity::Notice,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl SeoIssue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message: message.into(),
        }
    }
}

/// Detects on-page issues for a crawled HTML page
pub fn detect_issues(content: &NormalizedContent) -> Vec<SeoIssue> {
    let mut issues = Vec::new();

    if content.http_status >= 400 {
        issues.push(SeoIssue::new(
            IssueKind::HttpError,
            format!("HTTP status {}", content.http_status),
        ));
    }

    match content.title.as_deref() {
        None => issues.push(SeoIssue::new(IssueKind::MissingTitle, "Page has no title")),
        Some(title) => {
            let len = title.chars().count();
            if len > TITLE_MAX_CHARS {
                issues.push(SeoIssue::new(
                    IssueKind::TitleTooLong,
                    format!("Title is {} characters (max {})", len, TITLE_MAX_CHARS),
                ));
            } else if len < TITLE_MIN_CHARS {
                issues.push(SeoIssue::new(
                    IssueKind::TitleTooShort,
                    format!("Title is {} characters (min {})", len, TITLE_MIN_CHARS),
                ));
            }
        }
    }

    match content.meta_description.as_deref() {
        None => issues.push(SeoIssue::new(
            IssueKind::MissingMetaDescription,
            "Page has no meta description",
        )),
        Some(desc) => {
            let len = desc.chars().count();
            if len > DESCRIPTION_MAX_CHARS {
                issues.push(SeoIssue::new(
                    IssueKind::MetaDescriptionTooLong,
                    format!(
                        "Meta description is {} characters (max {})",
                        len, DESCRIPTION_MAX_CHARS
                    ),
                ));
            }
        }
    }

    match content.h1_count() {
        0 => issues.push(SeoIssue::new(IssueKind::MissingH1, "Page has no H1")),
        1 => {}
        n => issues.push(SeoIssue::new(
            IssueKind::MultipleH1,
            format!("Page has {} H1 headings", n),
        )),
    }

    if content.word_count < THIN_CONTENT_WORDS {
        issues.push(SeoIssue::new(
            IssueKind::ThinContent,
            format!("Only {} words of content", content.word_count),
        ));
    }

    let missing_alt = content.images_missing_alt();
    if missing_alt > 0 {
        issues.push(SeoIssue::new(
            IssueKind::ImagesMissingAlt,
            format!("{} image(s) without alt text", missing_alt),
        ));
    }

    if content.response_time_ms > SLOW_RESPONSE_MS {
        issues.push(SeoIssue::new(
            IssueKind::SlowResponse,
            format!("Response took {}ms", content.response_time_ms),
        ));
    }

    issues
}
