//! HTTP/1.1 fetch protocol
//!
//! This module implements the client side of the crawler's wire protocol:
//! - Request construction (origin-form or proxy absolute-form targets)
//! - Status line and header parsing
//! - Body decoding with Content-Length, chunked or read-until-close framing
//! - Response class handling, including explicit redirect rejection

mod client;
mod reader;
mod request;
mod response;

pub use client::{
    FetchClient, FetchResult, ProxyAddress, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT,
};
pub use reader::{ResponseReader, MAX_LINE_BYTES};
pub use request::{build_get_request, host_header, request_target, PROTOCOL, PROTOCOL_VERSION};
pub use response::{
    parse_chunk_size, parse_status_line, read_body, read_head, resolve_framing, Framing,
    ResponseClass, ResponseHead, StatusLine, MAX_HEADER_LINES,
};
