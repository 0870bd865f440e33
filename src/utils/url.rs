// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// # Examples
/// ```
/// use notice_relay::utils::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/News/Notice").unwrap();
/// assert_eq!(
///     resolve(&base, "/News/Notice/Article?Oid=1").unwrap().as_str(),
///     "https://example.com/News/Notice/Article?Oid=1"
/// );
/// ```
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    base.join(href.trim()).ok()
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Extract a numeric identifier from the given query parameter.
///
/// The key is matched case-insensitively. Values that are not purely ASCII
/// digits are rejected.
pub fn extract_query_id(url: &Url, param: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key.eq_ignore_ascii_case(param))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let base = url("https://maplestory.nexon.com/News/Notice");
        assert_eq!(
            resolve(&base, "/News/Notice/Article?Oid=12").unwrap().as_str(),
            "https://maplestory.nexon.com/News/Notice/Article?Oid=12"
        );
    }

    #[test]
    fn test_resolve_absolute_url() {
        let base = url("https://maplestory.nexon.com/");
        let resolved = resolve(&base, "https://other.com/page").unwrap();
        assert_eq!(resolved.as_str(), "https://other.com/page");
        assert!(!same_origin(&base, &resolved));
    }

    #[test]
    fn test_extract_query_id() {
        let article = url("https://maplestory.nexon.com/News/Notice/Article?Oid=147221&page=1");
        assert_eq!(extract_query_id(&article, "Oid"), Some("147221".to_string()));
        assert_eq!(extract_query_id(&article, "oid"), Some("147221".to_string()));
    }

    #[test]
    fn test_extract_query_id_rejects_non_numeric() {
        let article = url("https://example.com/Article?Oid=abc");
        assert_eq!(extract_query_id(&article, "Oid"), None);
    }

    #[test]
    fn test_extract_query_id_missing_param() {
        let article = url("https://example.com/Article?page=2");
        assert_eq!(extract_query_id(&article, "Oid"), None);
        let empty = url("https://example.com/Article?Oid=");
        assert_eq!(extract_query_id(&empty, "Oid"), None);
    }
}
