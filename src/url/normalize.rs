use crate::UrlError;
use url::Url;

/// Normalizes a URL into its canonical crawl form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Lowercase the host (default ports are dropped by the parser)
/// 4. Strip a single trailing slash from the path (root stays `/`)
/// 5. Remove the fragment
///
/// The query string is kept verbatim: parameter order and casing are
/// significant, so `?b=2&a=1` and `?a=1&b=2` are different resources.
///
/// # Examples
///
/// ```
/// use seo_crawler::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM:443/Docs/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/Docs?b=2&a=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?;
    if host.is_empty() {
        return Err(UrlError::MissingDomain);
    }
    let lowered = host.to_lowercase();
    if lowered != host {
        url.set_host(Some(&lowered))
            .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;
    }

    let path = url.path().to_string();
    if path.len() > 1 {
        if let Some(stripped) = path.strip_suffix('/') {
            url.set_path(stripped);
        }
    }

    url.set_fragment(None);

    Ok(url)
}

/// Returns the canonical comparison key for a URL string
///
/// Two URLs that name the same resource produce the same key; the frontier
/// relies on this for its `(project, url)` uniqueness.
pub fn url_key(url_str: &str) -> Result<String, UrlError> {
    normalize_url(url_str).map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_host_keeps_path_case() {
        let result = normalize_url("https://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result.as_str(), "https://example.com/Page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize_url("https://example.com/page/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_only_single_trailing_slash_removed() {
        let result = normalize_url("https://example.com/page//").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page/");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_drop_default_ports() {
        assert_eq!(
            url_key("http://example.com:80/a").unwrap(),
            "http://example.com/a"
        );
        assert_eq!(
            url_key("https://example.com:443/a").unwrap(),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_keep_non_default_port() {
        let result = normalize_url("http://127.0.0.1:8080/a/").unwrap();
        assert_eq!(result.as_str(), "http://127.0.0.1:8080/a");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_query_preserved_verbatim() {
        let result = normalize_url("https://example.com/search/?b=2&A=1&utm_source=x").unwrap();
        assert_eq!(
            result.as_str(),
            "https://example.com/search?b=2&A=1&utm_source=x"
        );
        assert_ne!(
            url_key("https://example.com/s?a=1&b=2").unwrap(),
            url_key("https://example.com/s?b=2&a=1").unwrap()
        );
    }

    #[test]
    fn test_surface_forms_share_key() {
        let forms = [
            "https://Example.com/about/",
            "https://example.COM/about",
            "https://example.com:443/about#team",
        ];
        let keys: Vec<String> = forms.iter().map(|f| url_key(f).unwrap()).collect();
        assert!(keys.iter().all(|k| k == "https://example.com/about"));
    }

    #[test]
    fn test_deterministic() {
        let a = url_key("https://example.com/x/?q=1").unwrap();
        let b = url_key("https://example.com/x/?q=1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize_url("ftp://example.com/page");
        assert!(matches!(result.unwrap_err(), UrlError::InvalidScheme(_)));
    }

    #[test]
    fn test_malformed_url() {
        assert!(matches!(
            normalize_url("not a url").unwrap_err(),
            UrlError::Parse(_)
        ));
        assert!(normalize_url("https://").is_err());
    }
}
