//! Response framing: status line, headers and body decoding
//!
//! Body framing is resolved once per response, by priority:
//! chunked transfer encoding, then an explicit `Content-Length`, then
//! reading until the connection closes.

use crate::http::reader::ResponseReader;
use crate::FetchError;
use std::fmt;
use tokio::io::AsyncBufRead;

/// Most header lines accepted in one response
pub const MAX_HEADER_LINES: usize = 128;

/// Response class derived from the hundreds digit of the status code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResponseClass {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 3xx
    Redirect,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
}

impl ResponseClass {
    /// Maps a status code in `100..=599` to its class
    pub fn from_status(code: u16) -> Option<Self> {
        match code / 100 {
            1 => Some(Self::Informational),
            2 => Some(Self::Success),
            3 => Some(Self::Redirect),
            4 => Some(Self::ClientError),
            5 => Some(Self::ServerError),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Informational => "informational",
            Self::Success => "success",
            Self::Redirect => "redirect",
            Self::ClientError => "client error",
            Self::ServerError => "server error",
        };
        f.write_str(name)
    }
}

/// How the body of a response was delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Exactly this many bytes, from `Content-Length`
    ContentLength(usize),

    /// `Transfer-Encoding: chunked`
    Chunked,

    /// No length information; read until the peer closed
    ReadUntilClose,
}

/// Parsed status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Protocol token, e.g. `HTTP/1.1`
    pub version: String,

    /// Numeric status code in `100..=599`
    pub code: u16,

    /// Reason phrase, possibly empty
    pub reason: String,

    /// Class of the status code
    pub class: ResponseClass,
}

/// Status line and headers of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusLine,

    /// Raw header lines, in order, without line terminators
    pub headers: Vec<String>,

    /// Body framing resolved from the headers
    pub framing: Framing,
}

impl ResponseHead {
    /// Returns the first value of a header, matching the name case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Parses a status line such as `HTTP/1.1 200 OK`
///
/// The protocol name must match `protocol` case-insensitively and the code
/// must be an integer in `100..=599`.
pub fn parse_status_line(line: &str, protocol: &str) -> Result<StatusLine, FetchError> {
    let malformed = |reason: &str| {
        FetchError::MalformedResponse(format!("{} in status line '{}'", reason, line))
    };

    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    let code = parts.next().ok_or_else(|| malformed("missing status code"))?;
    let reason = parts.next().unwrap_or_default();

    let (name, _) = version
        .split_once('/')
        .ok_or_else(|| malformed("missing protocol version"))?;
    if !name.eq_ignore_ascii_case(protocol) {
        return Err(malformed("unexpected protocol"));
    }

    let code = code.trim();
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("non-numeric status code"));
    }
    let code: u16 = code
        .parse()
        .map_err(|_| malformed("non-numeric status code"))?;
    let class =
        ResponseClass::from_status(code).ok_or_else(|| malformed("status code out of range"))?;

    Ok(StatusLine {
        version: version.to_string(),
        code,
        reason: reason.trim().to_string(),
        class,
    })
}

/// Resolves body framing from raw header lines
pub fn resolve_framing(headers: &[String]) -> Result<Framing, FetchError> {
    let mut content_length: Option<usize> = None;
    let mut chunked = false;

    for line in headers {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();

        if name.eq_ignore_ascii_case("Content-Length") {
            let invalid =
                || FetchError::MalformedResponse(format!("invalid Content-Length '{}'", value));
            if !value.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            let len: usize = value.parse().map_err(|_| invalid())?;
            if content_length.is_some_and(|previous| previous != len) {
                return Err(FetchError::MalformedResponse(
                    "conflicting Content-Length headers".to_string(),
                ));
            }
            content_length = Some(len);
        } else if name.eq_ignore_ascii_case("Transfer-Encoding") {
            chunked |= value
                .split(',')
                .any(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        }
    }

    Ok(if chunked {
        Framing::Chunked
    } else if let Some(len) = content_length {
        Framing::ContentLength(len)
    } else {
        Framing::ReadUntilClose
    })
}

/// Reads the status line and headers up to the blank line
pub async fn read_head<R: AsyncBufRead + Unpin>(
    reader: &mut ResponseReader<R>,
    protocol: &str,
) -> Result<ResponseHead, FetchError> {
    let line = reader.read_line().await?.ok_or_else(|| {
        FetchError::MalformedResponse("connection closed before status line".to_string())
    })?;
    tracing::trace!("< {}", line);
    let status = parse_status_line(&line, protocol)?;

    let mut headers = Vec::new();
    loop {
        let line = reader.read_line().await?.ok_or_else(|| {
            FetchError::MalformedResponse("connection closed inside headers".to_string())
        })?;
        if line.is_empty() {
            break;
        }
        tracing::trace!("< {}", line);
        if headers.len() == MAX_HEADER_LINES {
            return Err(FetchError::MalformedResponse(format!(
                "more than {} header lines",
                MAX_HEADER_LINES
            )));
        }
        headers.push(line);
    }

    let framing = resolve_framing(&headers)?;
    Ok(ResponseHead {
        status,
        headers,
        framing,
    })
}

/// Decodes the body according to `framing`
pub async fn read_body<R: AsyncBufRead + Unpin>(
    reader: &mut ResponseReader<R>,
    framing: Framing,
) -> Result<Vec<u8>, FetchError> {
    match framing {
        Framing::ContentLength(len) => reader.read_exact_body(len).await,
        Framing::Chunked => read_chunked(reader).await,
        Framing::ReadUntilClose => reader.read_to_close().await,
    }
}

/// Decodes a chunked body: size line, payload, CRLF; until a zero size
async fn read_chunked<R: AsyncBufRead + Unpin>(
    reader: &mut ResponseReader<R>,
) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    loop {
        let line = reader.read_line().await?.ok_or_else(|| {
            FetchError::MalformedResponse("connection closed before chunk size".to_string())
        })?;
        let size = parse_chunk_size(&line)?;
        if size == 0 {
            break;
        }

        let payload = reader.read_exact_body(size).await?;
        body.extend_from_slice(&payload);

        match reader.read_line().await? {
            Some(rest) if rest.is_empty() => {}
            _ => {
                return Err(FetchError::MalformedResponse(
                    "chunk payload not followed by CRLF".to_string(),
                ))
            }
        }
    }
    Ok(body)
}

/// Parses a hexadecimal chunk-size line, ignoring chunk extensions
pub fn parse_chunk_size(line: &str) -> Result<usize, FetchError> {
    let digits = line.split(';').next().unwrap_or_default().trim();
    let invalid = || FetchError::MalformedResponse(format!("invalid chunk size '{}'", line));
    // from_str_radix alone would accept a leading '+'
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    usize::from_str_radix(digits, 16).map_err(|_| invalid())
}
