//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed map of path -> body with 200, a configurable status for
//! chosen paths, and 404 for everything else. Counts GET requests per path.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct Routes {
    bodies: HashMap<String, Vec<u8>>,
    statuses: HashMap<String, u16>,
    required_header: Option<(String, String)>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, path: &str, body: &[u8]) -> Self {
        self.bodies.insert(path.to_string(), body.to_vec());
        self
    }

    pub fn status(mut self, path: &str, code: u16) -> Self {
        self.statuses.insert(path.to_string(), code);
        self
    }

    /// Reply 403 unless the request carries `name: value`.
    pub fn require_header(mut self, name: &str, value: &str) -> Self {
        self.required_header = Some((name.to_string(), value.to_string()));
        self
    }
}

pub struct TestServer {
    pub base: String,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(routes: Routes) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let hits = Arc::new(Mutex::new(HashMap::new()));
    let server_hits = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let hits = Arc::clone(&server_hits);
            thread::spawn(move || handle(stream, &routes, &hits));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        hits,
    }
}

fn handle(mut stream: TcpStream, routes: &Routes, hits: &Mutex<HashMap<String, usize>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    // Keep-alive: serve requests on this connection until the client closes it.
    loop {
        let Some(request) = read_request(&mut stream) else {
            return;
        };
        let (method, path, headers) = parse_request(&request);
        if !method.eq_ignore_ascii_case("GET") {
            let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
            continue;
        }
        *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

        let authorized = match &routes.required_header {
            Some((name, value)) => headers
                .iter()
                .any(|(n, v)| n.eq_ignore_ascii_case(name) && v == value),
            None => true,
        };
        let (status, body): (u16, &[u8]) = if !authorized {
            (403, &b"forbidden"[..])
        } else if let Some(code) = routes.statuses.get(&path) {
            (*code, &b"error"[..])
        } else if let Some(body) = routes.bodies.get(&path) {
            (200, body.as_slice())
        } else {
            (404, &b"not found"[..])
        };
        let head = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\n\r\n",
            status,
            reason(status),
            body.len()
        );
        if stream.write_all(head.as_bytes()).is_err() || stream.write_all(body).is_err() {
            return;
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Reads bytes up to the end of the request head (GET requests carry no body).
fn read_request(stream: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8(buf).ok()
}

/// Returns (method, path, headers).
fn parse_request(request: &str) -> (String, String, Vec<(String, String)>) {
    let mut lines = request.lines();
    let mut first = lines.next().unwrap_or("").split_whitespace();
    let method = first.next().unwrap_or("").to_string();
    let path = first.next().unwrap_or("/").to_string();
    let headers = lines
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();
    (method, path, headers)
}
