//! Hop-by-hop header stripping.
//!
//! # Responsibilities
//! - Drop connection-scoped headers before a header map crosses the proxy
//! - Applied to request headers going upstream and response headers coming back
//!
//! # Design Decisions
//! - Fixed deny-list, matched case-insensitively
//! - `host` and `content-length` are dropped too; the outbound client sets
//!   both for its own connection and framing

use axum::http::{HeaderMap, HeaderName};

/// Headers that are never relayed across the proxy boundary.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Check if a header is on the hop-by-hop deny-list.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.as_str().eq_ignore_ascii_case(h))
}

/// Return a copy of `headers` without hop-by-hop entries.
///
/// Repeated headers (e.g. several `set-cookie`) keep every value, in order.
pub fn filter_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        if !is_hop_by_hop(name) {
            filtered.append(name.clone(), value.clone());
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn header_map(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn strips_every_deny_listed_header() {
        let pairs: Vec<(&str, &str)> = HOP_BY_HOP_HEADERS.iter().map(|h| (*h, "x")).collect();
        let filtered = filter_hop_by_hop(&header_map(&pairs));
        assert!(filtered.is_empty());
    }

    #[test]
    fn matching_ignores_case() {
        let headers = header_map(&[
            ("Connection", "close"),
            ("Transfer-Encoding", "chunked"),
            ("HOST", "edge.local"),
            ("Content-Type", "application/json"),
        ]);
        let filtered = filter_hop_by_hop(&headers);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["content-type"], "application/json");
    }

    #[test]
    fn preserves_other_headers_and_repeated_values() {
        let headers = header_map(&[
            ("authorization", "Bearer abc"),
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
            ("x-request-id", "42"),
            ("keep-alive", "timeout=5"),
        ]);
        let filtered = filter_hop_by_hop(&headers);

        assert_eq!(filtered["authorization"], "Bearer abc");
        assert_eq!(filtered["x-request-id"], "42");
        let cookies: Vec<_> = filtered.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert!(!filtered.contains_key("keep-alive"));
    }

    #[test]
    fn similar_names_are_not_stripped() {
        let headers = header_map(&[("tea", "earl grey"), ("x-upgrade", "no")]);
        assert_eq!(filter_hop_by_hop(&headers).len(), 2);
    }
}
