//! Network retrieval boundary.
//!
//! The dispatcher only sees [`Fetcher`] and [`FetchSession`]. Each worker opens
//! one session when it starts and drops it when it exits, so a transport can
//! keep connections alive across that worker's items. [`CurlFetcher`] is the
//! libcurl implementation used by the CLI.

mod classify;
mod http;

use std::fmt;
use std::time::Duration;

pub use self::classify::{classify_curl_error, classify_http_status, ErrorKind};
pub use self::http::{CurlFetcher, CurlSession};

/// Body of a successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub status: u32,
}

/// A fetch that did not produce a usable body.
#[derive(Debug, Clone)]
pub struct FetchFailure {
    /// HTTP status, if a response was received.
    pub status: Option<u32>,
    pub kind: ErrorKind,
    pub cause: String,
}

impl FetchFailure {
    /// Non-success HTTP status.
    pub fn http(status: u32) -> Self {
        Self {
            status: Some(status),
            kind: classify_http_status(status),
            cause: format!("HTTP {}", status),
        }
    }

    /// Transport-level failure with no usable response.
    pub fn transport(kind: ErrorKind, cause: impl Into<String>) -> Self {
        Self {
            status: None,
            kind,
            cause: cause.into(),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl std::error::Error for FetchFailure {}

pub type FetchResult = Result<Fetched, FetchFailure>;

/// Per-worker transport session.
pub trait FetchSession {
    /// Fetch `locator`, failing instead of hanging once `timeout` elapses.
    fn fetch(&mut self, locator: &str, timeout: Duration) -> FetchResult;
}

/// Factory for per-worker sessions. Configuration shared by every request
/// (headers, connect timeout) lives here and is applied by each session.
pub trait Fetcher: Sync {
    type Session<'a>: FetchSession
    where
        Self: 'a;

    fn open_session(&self) -> Self::Session<'_>;
}
