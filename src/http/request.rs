//! Request construction
//!
//! Requests carry exactly a request line and a `Host` header:
//!
//! ```text
//! GET <target> HTTP/1.1\r\n
//! Host: <host>[:<port>]\r\n
//! \r\n
//! ```

use crate::url::{ParsedUrl, DEFAULT_HTTP_PORT};

/// Protocol name expected in response status lines
pub const PROTOCOL: &str = "HTTP";

/// Protocol token sent in request lines
pub const PROTOCOL_VERSION: &str = "HTTP/1.1";

/// Builds the `Host` header value: the host, plus the port unless it is 80
pub fn host_header(url: &ParsedUrl) -> String {
    match url.effective_port() {
        DEFAULT_HTTP_PORT => url.host.clone(),
        port => format!("{}:{}", url.host, port),
    }
}

/// Builds the request target
///
/// Through a proxy the target is the absolute URL; otherwise it is the
/// bare path.
pub fn request_target(url: &ParsedUrl, via_proxy: bool) -> String {
    if via_proxy {
        format!("{}://{}{}", url.scheme, host_header(url), url.path)
    } else {
        url.path.clone()
    }
}

/// Serializes a complete GET request
pub fn build_get_request(url: &ParsedUrl, via_proxy: bool) -> String {
    format!(
        "GET {} {}\r\nHost: {}\r\n\r\n",
        request_target(url, via_proxy),
        PROTOCOL_VERSION,
        host_header(url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::parse_url;

    #[test]
    fn test_direct_request_default_port() {
        let url = parse_url("http://example.com/a/b.html").unwrap();
        assert_eq!(
            build_get_request(&url, false),
            "GET /a/b.html HTTP/1.1\r\nHost: example.com\r\n\r\n"
        );
    }

    #[test]
    fn test_direct_request_explicit_port() {
        let url = parse_url("http://example.com:8080/").unwrap();
        assert_eq!(
            build_get_request(&url, false),
            "GET / HTTP/1.1\r\nHost: example.com:8080\r\n\r\n"
        );
    }

    #[test]
    fn test_explicit_port_80_is_omitted() {
        let url = parse_url("http://example.com:80/x").unwrap();
        assert_eq!(host_header(&url), "example.com");
    }

    #[test]
    fn test_proxy_request_uses_absolute_target() {
        let url = parse_url("http://example.com:8080/page").unwrap();
        assert_eq!(
            build_get_request(&url, true),
            "GET http://example.com:8080/page HTTP/1.1\r\nHost: example.com:8080\r\n\r\n"
        );

        let url = parse_url("http://example.com/page").unwrap();
        assert_eq!(request_target(&url, true), "http://example.com/page");
    }
}
