//! libcurl-backed fetcher: one reusable `Easy` handle per worker session.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{BatchError, Result};

use super::{classify_curl_error, FetchFailure, FetchResult, FetchSession, Fetched, Fetcher};

const MAX_REDIRECTS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// GET fetcher with headers shared by every request of the batch.
/// Redirects are followed; only a final 2xx status counts as success.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    headers: Vec<String>,
    connect_timeout: Duration,
}

impl CurlFetcher {
    /// Build a fetcher sending `headers` with every request.
    /// Header names or values containing line breaks or NUL are rejected.
    pub fn new(headers: &BTreeMap<String, String>) -> Result<Self> {
        let mut lines = Vec::with_capacity(headers.len());
        for (name, value) in headers {
            let (name, value) = (name.trim(), value.trim());
            let bad = |s: &str| s.contains(['\r', '\n', '\0']);
            if name.is_empty() || name.contains(':') || bad(name) || bad(value) {
                return Err(BatchError::invariant(format!("invalid header {:?}", name)));
            }
            lines.push(format!("{}: {}", name, value));
        }
        Ok(Self {
            headers: lines,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Header lines as sent (`Name: value`).
    pub fn header_lines(&self) -> &[String] {
        &self.headers
    }
}

impl Fetcher for CurlFetcher {
    type Session<'a> = CurlSession<'a>;

    fn open_session(&self) -> CurlSession<'_> {
        CurlSession {
            fetcher: self,
            easy: curl::easy::Easy::new(),
        }
    }
}

/// One worker's curl handle. Reusing it keeps connections alive between items.
pub struct CurlSession<'a> {
    fetcher: &'a CurlFetcher,
    easy: curl::easy::Easy,
}

impl CurlSession<'_> {
    fn configure(&mut self, locator: &str, timeout: Duration) -> std::result::Result<(), curl::Error> {
        // reset() clears per-request options but keeps the connection cache.
        self.easy.reset();
        self.easy.url(locator)?;
        self.easy.get(true)?;
        self.easy.follow_location(true)?;
        self.easy.max_redirections(MAX_REDIRECTS)?;
        self.easy.connect_timeout(self.fetcher.connect_timeout.min(timeout))?;
        self.easy.timeout(timeout)?;
        if !self.fetcher.headers.is_empty() {
            let mut list = curl::easy::List::new();
            for line in &self.fetcher.headers {
                list.append(line)?;
            }
            self.easy.http_headers(list)?;
        }
        Ok(())
    }
}

fn curl_failure(e: curl::Error) -> FetchFailure {
    FetchFailure::transport(classify_curl_error(&e), e.to_string())
}

impl FetchSession for CurlSession<'_> {
    fn fetch(&mut self, locator: &str, timeout: Duration) -> FetchResult {
        self.configure(locator, timeout).map_err(curl_failure)?;

        let mut body = Vec::new();
        {
            let mut transfer = self.easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(curl_failure)?;
            transfer.perform().map_err(curl_failure)?;
        }

        let status = self.easy.response_code().map_err(curl_failure)?;
        if !(200..300).contains(&status) {
            return Err(FetchFailure::http(status));
        }
        Ok(Fetched {
            bytes: body,
            status,
        })
    }
}
