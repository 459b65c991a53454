//! Deadline-bounded reading primitives for HTTP responses

use crate::FetchError;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::{timeout_at, Instant};

/// Longest accepted status, header or chunk-size line, in bytes
pub const MAX_LINE_BYTES: usize = 16 * 1024;

const READ_BUFFER_BYTES: usize = 8 * 1024;

/// Buffered reader whose every operation shares one exchange deadline
pub struct ResponseReader<R> {
    inner: R,
    deadline: Instant,
}

impl<R: AsyncBufRead + Unpin> ResponseReader<R> {
    /// Wraps a reader; all reads must complete before `deadline`
    pub fn new(inner: R, deadline: Instant) -> Self {
        Self { inner, deadline }
    }

    /// Moves the deadline for subsequent reads
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = deadline;
    }

    /// Reads one line and strips its line terminator
    ///
    /// Returns `Ok(None)` if the stream ended before any byte was read.
    pub async fn read_line(&mut self) -> Result<Option<String>, FetchError> {
        let mut buf = Vec::new();
        let limit = MAX_LINE_BYTES as u64 + 1;
        let reader = &mut self.inner;
        let read = within(
            self.deadline,
            "reading response line",
            reader.take(limit).read_until(b'\n', &mut buf),
        )
        .await??;

        if read == 0 {
            return Ok(None);
        }
        if !buf.ends_with(b"\n") && buf.len() > MAX_LINE_BYTES {
            return Err(FetchError::MalformedResponse(format!(
                "line exceeds {} bytes",
                MAX_LINE_BYTES
            )));
        }

        while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
            buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Reads exactly `len` bytes
    ///
    /// Fewer bytes before end of stream is a truncated body.
    pub async fn read_exact_body(&mut self, len: usize) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::with_capacity(len.min(READ_BUFFER_BYTES * 8));
        let reader = &mut self.inner;
        within(
            self.deadline,
            "reading response body",
            reader.take(len as u64).read_to_end(&mut body),
        )
        .await??;

        if body.len() < len {
            return Err(FetchError::MalformedResponse(format!(
                "body truncated: expected {} bytes, got {}",
                len,
                body.len()
            )));
        }
        Ok(body)
    }

    /// Reads until the peer closes the stream or the deadline passes
    ///
    /// Whatever arrived before either event is returned.
    pub async fn read_to_close(&mut self) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut chunk = vec![0u8; READ_BUFFER_BYTES];
        loop {
            match timeout_at(self.deadline, self.inner.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => body.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => return Err(FetchError::Io(e)),
                Err(_) => {
                    tracing::debug!(
                        "Deadline reached while reading until close, keeping {} bytes",
                        body.len()
                    );
                    break;
                }
            }
        }
        Ok(body)
    }
}

/// Runs `fut` to completion before `deadline`, or fails with `Timeout`
pub(crate) async fn within<F: Future>(
    deadline: Instant,
    stage: &'static str,
    fut: F,
) -> Result<F::Output, FetchError> {
    timeout_at(deadline, fut)
        .await
        .map_err(|_| FetchError::Timeout(stage))
}
