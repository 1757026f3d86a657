use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error;

use super::http_status::HttpStatus;

/// Startup failures. All of these are fatal.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] IoError),
    #[error("cannot resolve address {0}")]
    AddrResolve(String),
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: IoError },
    #[error("cannot serve directory {path:?}: {source}")]
    Root { path: PathBuf, source: IoError },
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("connection closed before a request arrived")]
    ConnectionClosed,
    #[error("empty request line")]
    EmptyRequestLine,
    #[error("request line too long")]
    RequestLineTooLong,
    #[error("bad request syntax: {0:?}")]
    MalformedRequestLine(String),
    #[error("bad HTTP/0.9 request type ({0:?})")]
    BadHttp09Method(String),
    #[error("bad request version: {0:?}")]
    BadVersion(String),
    #[error("unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
    #[error("header line too long")]
    HeaderLineTooLong,
    #[error("too many headers")]
    TooManyHeaders,
    #[error("malformed header: {0:?}")]
    MalformedHeader(String),
    #[error("IO error: {0}")]
    Io(#[from] IoError),
}

impl RequestError {
    /// Status to answer with, or `None` when the connection should just close.
    pub fn status(&self) -> Option<HttpStatus> {
        match self {
            Self::ConnectionClosed | Self::EmptyRequestLine | Self::Io(_) => None,
            Self::RequestLineTooLong => Some(HttpStatus::UriTooLong),
            Self::HeaderLineTooLong | Self::TooManyHeaders => {
                Some(HttpStatus::HeaderFieldsTooLarge)
            }
            Self::MalformedRequestLine(_)
            | Self::BadHttp09Method(_)
            | Self::BadVersion(_)
            | Self::MalformedHeader(_) => Some(HttpStatus::BadRequest),
            Self::UnsupportedVersion(_) => Some(HttpStatus::VersionNotSupported),
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("request target is not an absolute path")]
    NotAbsolute,
    #[error("request path escapes the root directory")]
    Traversal,
}

impl ResolveError {
    pub fn status(&self) -> HttpStatus {
        match self {
            Self::NotAbsolute => HttpStatus::BadRequest,
            Self::Traversal => HttpStatus::Forbidden,
        }
    }
}

/// Failures while streaming a response body that are not a client hang-up.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("error reading source: {0}")]
    Read(IoError),
    #[error("error writing to client: {0}")]
    Write(IoError),
}
