//! URL normalization for duplicate detection

use url::Url;

/// Reduce a navigation target to scheme, host and path.
///
/// Query strings and fragments are dropped, the host is lowercased, a
/// default port disappears and a trailing slash is ignored. Text that does not
/// parse as an absolute URL falls back to its trimmed form minus any query or
/// fragment, so it still compares sensibly against itself.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();

    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => {
            let host = url.host_str().unwrap_or_default().to_lowercase();
            let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
            let path = url.path().trim_end_matches('/');
            let path = if path.is_empty() { "/" } else { path };
            format!("{}://{}{}{}", url.scheme(), host, port, path)
        }
        _ => {
            let end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
            trimmed[..end].to_string()
        }
    }
}

/// Host portion of a URL, if it has one
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_lowercase()))
}
