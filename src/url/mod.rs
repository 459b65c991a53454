//! URL handling module for Ripcrawl
//!
//! This module provides the URL validator used on every URL before it is
//! fetched, and the mapping from a URL path to the output file name.
//!
//! URL identity throughout the crawler is the exact input string: no
//! case-folding, default-port stripping or trailing-slash collapsing is
//! performed anywhere.

mod filename;

pub use filename::output_filename;

use crate::{UrlError, UrlResult};
use std::fmt;

/// Port used when a URL does not carry one explicitly
pub const DEFAULT_HTTP_PORT: u16 = 80;

/// The components of a validated URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Scheme as written, without the `://` separator
    pub scheme: String,

    /// Host as written
    pub host: String,

    /// Explicit port, `None` when the URL does not carry one
    pub port: Option<u16>,

    /// Path, always starting with `/`, including any query string
    pub path: String,
}

impl ParsedUrl {
    /// Returns the port to connect to, applying the HTTP default
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_HTTP_PORT)
    }

    /// Returns true when the scheme is `http` or `https`
    pub fn is_http(&self) -> bool {
        self.scheme == "http" || self.scheme == "https"
    }

    /// Fails with `UnsupportedProtocol` unless the scheme is `http` or `https`
    pub fn require_http(&self) -> UrlResult<()> {
        if self.is_http() {
            Ok(())
        } else {
            Err(UrlError::UnsupportedProtocol(self.scheme.clone()))
        }
    }
}

impl fmt::Display for ParsedUrl {
    /// Reconstructs `scheme://host[:port]path`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        f.write_str(&self.path)
    }
}

/// Parses a URL into scheme, host, optional port and path
///
/// A URL is accepted only if reconstructing it from its parts yields the
/// input byte for byte. This rejects, among others:
///
/// - a missing `://` separator or an empty scheme
/// - an empty host
/// - a non-numeric, negative or out-of-range port, or one with leading zeros
/// - an authority that is not terminated by `/`
/// - whitespace or control characters anywhere in the input
///
/// # Examples
///
/// ```
/// use ripcrawl::url::parse_url;
///
/// let parsed = parse_url("http://host:8080/a/b").unwrap();
/// assert_eq!(parsed.host, "host");
/// assert_eq!(parsed.port, Some(8080));
/// assert_eq!(parsed.to_string(), "http://host:8080/a/b");
///
/// assert!(parse_url("not-a-url").is_err());
/// ```
pub fn parse_url(url: &str) -> UrlResult<ParsedUrl> {
    let invalid = |reason: &'static str| UrlError::Invalid {
        url: url.to_string(),
        reason,
    };

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("contains whitespace or control characters"));
    }

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| invalid("missing scheme separator"))?;
    if scheme.is_empty() {
        return Err(invalid("empty scheme"));
    }

    let slash = rest
        .find('/')
        .ok_or_else(|| invalid("host is not terminated by '/'"))?;
    let (authority, path) = rest.split_at(slash);

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => {
            if port.is_empty() {
                return Err(invalid("empty port"));
            }
            if !port.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("non-numeric port"));
            }
            let port: u16 = port.parse().map_err(|_| invalid("port out of range"))?;
            (host, Some(port))
        }
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(invalid("empty host"));
    }

    let parsed = ParsedUrl {
        scheme: scheme.to_string(),
        host: host.to_string(),
        port,
        path: path.to_string(),
    };

    if parsed.to_string() != url {
        return Err(invalid("reconstructed URL does not match input"));
    }

    Ok(parsed)
}

/// Parses a URL and additionally requires an `http` or `https` scheme
pub fn parse_http_url(url: &str) -> UrlResult<ParsedUrl> {
    let parsed = parse_url(url)?;
    parsed.require_http()?;
    Ok(parsed)
}
