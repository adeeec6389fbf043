//! Small helpers for the auth handlers.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Key used when no client address can be determined.
pub(crate) const UNKNOWN_CLIENT: &str = "unknown";

/// Extract a client IP from common proxy headers.
pub(crate) fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Lockout key for a request: peer address first, then proxy headers.
pub(crate) fn client_key(peer: Option<SocketAddr>, headers: &HeaderMap) -> String {
    peer.map(|addr| addr.ip().to_string())
        .or_else(|| extract_client_ip(headers))
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn peer_address_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        let peer: Option<SocketAddr> = "192.0.2.1:5555".parse().ok();
        assert_eq!(client_key(peer, &headers), "192.0.2.1");
    }

    #[test]
    fn forwarded_for_uses_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"),
        );
        assert_eq!(client_key(None, &headers), "203.0.113.9");
    }

    #[test]
    fn real_ip_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_key(None, &headers), "198.51.100.4");
    }

    #[test]
    fn placeholder_when_nothing_is_known() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_key(None, &headers), UNKNOWN_CLIENT);
    }
}
