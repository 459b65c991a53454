//! Minimal HTTP/1.1 file server
//!
//! Serves files below a root directory using the same framing the crawler
//! reads: a status line, a `Content-Length` header and the body. Requests
//! must be `GET /<path> HTTP/1.1` with a `Host` header; anything else gets
//! `400 Bad Request` and the connection is closed. Connections are kept
//! open across requests until the client closes them or goes idle.
//!
//! The server stops accepting once no connection has arrived for the idle
//! timeout, then waits for open connections to finish.

use crate::http::{ResponseReader, MAX_HEADER_LINES, PROTOCOL_VERSION};
use crate::FetchError;
use std::io;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{timeout, Instant};

/// How long the server waits for a new connection before stopping
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(40);

/// Body served for `/`
pub const WELCOME_BODY: &str = "Welcome to ripcrawl-serve!\r\n";

const BAD_REQUEST_BODY: &str = "Sorry, bad request.\r\n";
const NOT_FOUND_BODY: &str = "Sorry, not found.\r\n";

/// File server settings
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Directory files are served from
    pub root: PathBuf,

    /// Connections handled concurrently
    pub workers: usize,

    /// Stop after this long without a new connection; also bounds how long
    /// an open connection may sit between requests
    pub idle_timeout: Duration,
}

impl ServerOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            workers: 1,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Counters returned when the server stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerSummary {
    pub connections: u64,
    pub requests: u64,
}

/// Status of one answered request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    BadRequest,
    NotFound,
}

impl Status {
    fn line(self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::BadRequest => "400 Bad Request",
            Status::NotFound => "404 Not Found",
        }
    }
}

/// A bound file server
pub struct FileServer {
    listener: TcpListener,
    options: ServerOptions,
}

impl FileServer {
    /// Binds the listening socket
    ///
    /// # Returns
    ///
    /// * `Ok(FileServer)` - The socket is bound
    /// * `Err(io::Error)` - Zero workers, a missing root directory, or the bind failed
    pub async fn bind(addr: impl ToSocketAddrs, options: ServerOptions) -> io::Result<Self> {
        if options.workers == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "server needs at least one worker",
            ));
        }
        if !tokio::fs::metadata(&options.root).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a directory", options.root.display()),
            ));
        }
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, options })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the idle timeout passes without one
    pub async fn run(self) -> io::Result<ServerSummary> {
        let permits = Arc::new(Semaphore::new(self.options.workers));
        let root: Arc<Path> = Arc::from(self.options.root.as_path());
        let idle = self.options.idle_timeout;
        let mut handlers = JoinSet::new();
        let mut summary = ServerSummary::default();

        tracing::info!(
            "Serving {} on {} with {} workers",
            root.display(),
            self.local_addr()?,
            self.options.workers
        );

        loop {
            let (stream, peer) = match timeout(idle, self.listener.accept()).await {
                Err(_) => {
                    tracing::info!("No connection for {:?}, shutting down", idle);
                    break;
                }
                Ok(Err(e)) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
                Ok(Ok(accepted)) => accepted,
            };

            summary.connections += 1;
            let permits = Arc::clone(&permits);
            let root = Arc::clone(&root);
            handlers.spawn(async move {
                // Held for the lifetime of the connection
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return 0,
                };
                tracing::debug!("Connection from {}", peer);
                match serve_connection(stream, &root, idle).await {
                    Ok(requests) => requests,
                    Err(e) => {
                        tracing::debug!("Connection from {} ended: {}", peer, e);
                        0
                    }
                }
            });

            // Reap finished handlers so the set does not grow unbounded
            while let Some(done) = handlers.try_join_next() {
                summary.requests += done.unwrap_or(0);
            }
        }

        while let Some(done) = handlers.join_next().await {
            summary.requests += done.unwrap_or(0);
        }

        tracing::info!(
            "Served {} requests over {} connections",
            summary.requests,
            summary.connections
        );
        Ok(summary)
    }
}

/// Answers requests on one connection until the client closes it, goes
/// idle, or sends a bad request. Returns the number of requests answered.
async fn serve_connection(stream: TcpStream, root: &Path, idle: Duration) -> io::Result<u64> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = ResponseReader::new(BufReader::new(read_half), Instant::now() + idle);
    let mut answered = 0;

    loop {
        reader.set_deadline(Instant::now() + idle);
        let head = match read_request_head(&mut reader).await {
            Ok(Some(head)) => head,
            Ok(None) => break,
            Err(FetchError::Timeout(_)) => {
                tracing::debug!("Connection idle for {:?}, closing", idle);
                break;
            }
            Err(FetchError::MalformedResponse(reason)) => {
                tracing::debug!("Unreadable request: {}", reason);
                write_response(&mut write_half, Status::BadRequest, BAD_REQUEST_BODY.as_bytes())
                    .await?;
                answered += 1;
                break;
            }
            Err(e) => return Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        };

        let (status, body) = match request_path(&head) {
            Some(path) => resolve(root, path).await,
            None => (Status::BadRequest, BAD_REQUEST_BODY.as_bytes().to_vec()),
        };
        tracing::debug!(
            "{} -> {}",
            head.first().map(String::as_str).unwrap_or(""),
            status.line()
        );
        write_response(&mut write_half, status, &body).await?;
        answered += 1;

        if status == Status::BadRequest {
            break;
        }
    }

    let _ = write_half.shutdown().await;
    Ok(answered)
}

/// Reads lines up to the blank line ending a request head
///
/// Returns `Ok(None)` if the client closed the connection first.
async fn read_request_head<R>(
    reader: &mut ResponseReader<R>,
) -> Result<Option<Vec<String>>, FetchError>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    loop {
        match reader.read_line().await? {
            None => return Ok(None),
            Some(line) if line.is_empty() => {
                // Tolerate blank lines between requests
                if lines.is_empty() {
                    continue;
                }
                return Ok(Some(lines));
            }
            Some(line) => {
                // lines[0] is the request line; the rest are headers
                if lines.len() == MAX_HEADER_LINES + 1 {
                    return Err(FetchError::MalformedResponse(
                        "too many request header lines".to_string(),
                    ));
                }
                lines.push(line);
            }
        }
    }
}

/// Extracts the path of a well-formed `GET /<path> HTTP/1.1` request with
/// a `Host` header
fn request_path(head: &[String]) -> Option<&str> {
    let (request_line, headers) = head.split_first()?;
    let mut parts = request_line.split(' ');
    let (method, path, version) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some()
        || method != "GET"
        || !path.starts_with('/')
        || version != PROTOCOL_VERSION
    {
        return None;
    }

    let has_host = headers.iter().any(|line| {
        line.split_once(':')
            .map(|(name, value)| name.trim().eq_ignore_ascii_case("host") && !value.trim().is_empty())
            .unwrap_or(false)
    });
    has_host.then_some(path)
}

/// Maps a request path to a response
async fn resolve(root: &Path, path: &str) -> (Status, Vec<u8>) {
    if path == "/" {
        return (Status::Ok, WELCOME_BODY.as_bytes().to_vec());
    }

    let relative = Path::new(path.trim_start_matches('/'));
    let escapes_root = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes_root {
        return (Status::NotFound, NOT_FOUND_BODY.as_bytes().to_vec());
    }

    match tokio::fs::read(root.join(relative)).await {
        Ok(contents) => (Status::Ok, contents),
        Err(e) => {
            tracing::debug!("Cannot serve {}: {}", path, e);
            (Status::NotFound, NOT_FOUND_BODY.as_bytes().to_vec())
        }
    }
}

async fn write_response<W>(writer: &mut W, status: Status, body: &[u8]) -> io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let head = format!(
        "{} {}\r\nContent-Length: {}\r\n\r\n",
        PROTOCOL_VERSION,
        status.line(),
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await
}
