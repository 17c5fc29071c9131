use url::{Host, Url};

/// Returns the registrable domain of a URL's host
///
/// Uses the Public Suffix List, private section included, so
/// `blog.example.com` and `www.example.com` both map to `example.com`,
/// `shop.example.co.uk` maps to `example.co.uk` and `alice.github.io` stays
/// `alice.github.io`. IP addresses, single-label hosts (e.g. `localhost`)
/// and bare suffixes are returned unchanged.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_crawler::url::registrable_domain;
///
/// let url = Url::parse("https://Shop.Example.CO.UK/path").unwrap();
/// assert_eq!(registrable_domain(&url), Some("example.co.uk".to_string()));
/// ```
pub fn registrable_domain(url: &Url) -> Option<String> {
    let host = match url.host()? {
        Host::Domain(d) => d.trim_end_matches('.').to_lowercase(),
        Host::Ipv4(ip) => return Some(ip.to_string()),
        Host::Ipv6(ip) => return Some(ip.to_string()),
    };

    let domain = psl::domain_str(&host).map(str::to_string);
    Some(domain.unwrap_or(host))
}

/// Checks whether two URLs belong to the same site (same registrable domain)
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (registrable_domain(a), registrable_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
