//! Classify HTTP status and curl errors for failure reporting.

/// High-level classification of a failed fetch.
///
/// The breaker counts every kind the same; the kind only travels with
/// progress events and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect or total).
    Timeout,
    /// Server asked us to slow down (429, 503).
    Throttled,
    /// Network-level failure (connection refused/reset, DNS).
    Connection,
    /// Any other non-2xx status.
    Status(u32),
    /// Anything else (bad URL, TLS, local write error).
    Other,
}

/// Classify a non-success HTTP status code.
pub fn classify_http_status(code: u32) -> ErrorKind {
    match code {
        429 | 503 => ErrorKind::Throttled,
        _ => ErrorKind::Status(code),
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> ErrorKind {
    if e.is_operation_timedout() {
        return ErrorKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
    {
        return ErrorKind::Connection;
    }
    ErrorKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_and_503_throttled() {
        assert_eq!(classify_http_status(429), ErrorKind::Throttled);
        assert_eq!(classify_http_status(503), ErrorKind::Throttled);
    }

    #[test]
    fn other_statuses_keep_code() {
        assert_eq!(classify_http_status(404), ErrorKind::Status(404));
        assert_eq!(classify_http_status(500), ErrorKind::Status(500));
        assert_eq!(classify_http_status(301), ErrorKind::Status(301));
    }

    #[test]
    fn curl_timeout_and_connect() {
        // CURLE_OPERATION_TIMEDOUT = 28, CURLE_COULDNT_CONNECT = 7
        assert_eq!(classify_curl_error(&curl::Error::new(28)), ErrorKind::Timeout);
        assert_eq!(classify_curl_error(&curl::Error::new(7)), ErrorKind::Connection);
        // CURLE_URL_MALFORMAT = 3
        assert_eq!(classify_curl_error(&curl::Error::new(3)), ErrorKind::Other);
    }
}
