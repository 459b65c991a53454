//! One-shot HTTP/1.1 client over a plain TCP connection
//!
//! Each fetch opens its own connection, sends one GET request, decodes one
//! response and closes the connection. There is no pipelining, no
//! keep-alive, no TLS and no redirect following: a 3xx response is reported
//! as [`FetchError::RedirectUnsupported`].

use crate::http::reader::{within, ResponseReader};
use crate::http::request::{build_get_request, PROTOCOL};
use crate::http::response::{read_body, read_head, Framing, ResponseClass};
use crate::url::{parse_url, ParsedUrl};
use crate::FetchError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default bound on the whole response exchange
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);

/// A decoded response
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Status code
    pub status: u16,

    /// Reason phrase from the status line
    pub reason: String,

    /// Class of the status code
    pub class: ResponseClass,

    /// Raw header lines, without line terminators
    pub headers: Vec<String>,

    /// Decoded body
    pub body: Vec<u8>,

    /// Framing used to decode the body
    pub framing: Framing,
}

impl FetchResult {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        self.class == ResponseClass::Success
    }
}

/// Address of an HTTP proxy, written `host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for ProxyAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| format!("proxy '{}' must be written host:port", s))?;
        if host.is_empty() {
            return Err(format!("proxy '{}' has an empty host", s));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| format!("proxy '{}' has an invalid port", s))?;
        if port == 0 {
            return Err(format!("proxy '{}' has port 0", s));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// HTTP client performing one request per connection
#[derive(Debug, Clone)]
pub struct FetchClient {
    connect_timeout: Duration,
    read_timeout: Duration,
    proxy: Option<ProxyAddress>,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT)
    }
}

impl FetchClient {
    /// Creates a client connecting directly to origin servers
    ///
    /// # Arguments
    ///
    /// * `connect_timeout` - Bound on establishing the TCP connection
    /// * `read_timeout` - Bound on sending the request and reading the full response
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
            proxy: None,
        }
    }

    /// Routes every request through `proxy`
    pub fn with_proxy(mut self, proxy: ProxyAddress) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// The proxy in use, if any
    pub fn proxy(&self) -> Option<&ProxyAddress> {
        self.proxy.as_ref()
    }

    /// Validates `url` and fetches it
    pub async fn fetch_url(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = parse_url(url)?;
        self.fetch(&parsed).await
    }

    /// Performs one GET request/response exchange
    ///
    /// # Request Flow
    ///
    /// 1. Reject schemes other than `http`/`https`
    /// 2. Connect to the origin (or proxy) within the connect timeout
    /// 3. Send the request and read the response within the read timeout
    /// 4. Reject 3xx responses with `RedirectUnsupported`
    /// 5. Decode the body using the framing announced by the headers
    ///
    /// Responses of every other class are returned with their class tagged;
    /// deciding what to do with non-2xx responses is up to the caller.
    pub async fn fetch(&self, url: &ParsedUrl) -> Result<FetchResult, FetchError> {
        url.require_http()?;

        let (host, port) = match &self.proxy {
            Some(proxy) => (proxy.host.as_str(), proxy.port),
            None => (url.host.as_str(), url.effective_port()),
        };
        let address = format!("{}:{}", host, port);

        let connect = TcpStream::connect((host, port));
        let mut stream = match timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(FetchError::ConnectFailure { address, source }),
            Err(_) => return Err(FetchError::Timeout("connect")),
        };
        tracing::trace!("Connected to {}", address);

        let deadline = Instant::now() + self.read_timeout;
        let request = build_get_request(url, self.proxy.is_some());
        tracing::trace!("> {}", request.lines().next().unwrap_or_default());
        within(deadline, "sending request", stream.write_all(request.as_bytes())).await??;
        within(deadline, "sending request", stream.flush()).await??;

        let mut reader = ResponseReader::new(BufReader::new(stream), deadline);
        let head = read_head(&mut reader, PROTOCOL).await?;

        if head.status.class == ResponseClass::Redirect {
            return Err(FetchError::RedirectUnsupported {
                status: head.status.code,
                location: head.header("Location").map(str::to_string),
            });
        }

        let body = read_body(&mut reader, head.framing).await?;
        tracing::debug!(
            "Fetched {} -> {} ({} bytes, {:?})",
            url,
            head.status.code,
            body.len(),
            head.framing
        );

        Ok(FetchResult {
            status: head.status.code,
            reason: head.status.reason,
            class: head.status.class,
            headers: head.headers,
            body,
            framing: head.framing,
        })
    }
}
