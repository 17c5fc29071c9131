/// Checks if a URL matches a glob pattern
///
/// The pattern is anchored at both ends and `*` matches any run of
/// characters (including none). There is no other special syntax.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::matches_pattern;
///
/// assert!(matches_pattern("*/admin/*", "https://example.com/admin/users"));
/// assert!(matches_pattern("https://example.com/*", "https://example.com/"));
/// assert!(!matches_pattern("*/admin/*", "https://example.com/blog"));
/// ```
pub fn matches_pattern(pattern: &str, candidate: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let c: Vec<char> = candidate.chars().collect();

    let (mut pi, mut ci) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut star_ci = 0usize;

    while ci < c.len() {
        if pi < p.len() && p[pi] != '*' && p[pi] == c[ci] {
            pi += 1;
            ci += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            star_ci = ci;
            pi += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            star_ci += 1;
            ci = star_ci;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }

    pi == p.len()
}

/// Include/exclude URL filter for a crawl job
///
/// A URL passes when it matches no exclude pattern and, if any include
/// patterns are configured, at least one of them.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl UrlFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        Self {
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        }
    }

    pub fn allows(&self, url: &str) -> bool {
        if self.exclude.iter().any(|p| matches_pattern(p, url)) {
            return false;
        }

        self.include.is_empty() || self.include.iter().any(|p| matches_pattern(p, url))
    }
}
