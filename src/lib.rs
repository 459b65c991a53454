//! Ripcrawl: a concurrent web crawler
//!
//! Starting from a seed URL, the crawler fetches each resource over a plain
//! HTTP/1.1 connection, extracts outbound links and fetches every newly
//! discovered URL exactly once, using a fixed pool of workers that shut down
//! as soon as nothing is queued and nothing is in flight.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod http;
pub mod output;
pub mod server;
pub mod url;

use thiserror::Error;

/// Fatal errors that stop a crawl before or while it is being set up
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: &'static str },

    #[error("Unsupported protocol '{0}', only http and https are supported")]
    UnsupportedProtocol(String),
}

/// Errors produced by a single fetch
///
/// None of these stop a crawl; the failed URL is dropped and the worker
/// moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Url(#[from] UrlError),

    #[error("Failed to connect to {address}: {source}")]
    ConnectFailure {
        address: String,
        source: std::io::Error,
    },

    #[error("Timed out during {0}")]
    Timeout(&'static str),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Redirect ({status}) not supported, location: {}", .location.as_deref().unwrap_or("<none>"))]
    RedirectUnsupported {
        status: u16,
        location: Option<String>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat classification of fetch failures, used for accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    InvalidUrl,
    UnsupportedProtocol,
    ConnectFailure,
    Timeout,
    MalformedResponse,
    RedirectUnsupported,
    IoFailure,
}

impl FetchError {
    /// Returns the failure class of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Url(UrlError::Invalid { .. }) => FailureKind::InvalidUrl,
            Self::Url(UrlError::UnsupportedProtocol(_)) => FailureKind::UnsupportedProtocol,
            Self::ConnectFailure { .. } => FailureKind::ConnectFailure,
            Self::Timeout(_) => FailureKind::Timeout,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
            Self::RedirectUnsupported { .. } => FailureKind::RedirectUnsupported,
            Self::Io(_) => FailureKind::IoFailure,
        }
    }

    /// Returns true for errors caused by the URL itself rather than the exchange
    pub fn is_url_level(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Coordinator;
pub use frontier::{Dequeued, Frontier, WorkItem};
pub use http::{FetchClient, FetchResult, Framing, ResponseClass};
pub use self::url::{parse_url, ParsedUrl};
