use serde::Deserialize;

/// Main configuration structure for Ripcrawl
///
/// Every section is optional; missing sections and keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub proxy: Option<ProxyConfig>,
    pub pool: PoolConfig,
    pub output: OutputConfig,
}

/// Network timeouts for a single fetch
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Bound on establishing a TCP connection (milliseconds)
    #[serde(rename = "connect-timeout-ms")]
    pub connect_timeout_ms: u64,

    /// Bound on sending the request and reading the whole response (milliseconds)
    #[serde(rename = "read-timeout-ms")]
    pub read_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 2000,
            read_timeout_ms: 2000,
        }
    }
}

/// HTTP proxy all requests are routed through
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host name or address
    pub host: String,

    /// Proxy port
    pub port: u16,
}

/// Worker pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of workers
    pub size: usize,

    /// How long to wait for workers to exit once the crawl is over (milliseconds)
    #[serde(rename = "shutdown-grace-ms")]
    pub shutdown_grace_ms: u64,

    /// Interval between progress log lines (milliseconds)
    #[serde(rename = "progress-interval-ms")]
    pub progress_interval_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 4,
            shutdown_grace_ms: 500,
            progress_interval_ms: 5000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory fetched pages are written to
    pub directory: String,

    /// Whether successfully fetched pages are written at all
    #[serde(rename = "save-pages")]
    pub save_pages: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            save_pages: true,
        }
    }
}
