//! Mock Zoho server for testing
//!
//! Serves both halves of the Zoho API from one port, so the real HTTP
//! adapters can be exercised without Zoho credentials:
//! - POST /oauth/v2/token issues `{ access_token, expires_in }`
//! - GET /api/v3/{endpoint}?organization_id=... answers from canned routes
//!
//! Ledger requests must carry `Authorization: Zoho-oauthtoken <token>` with a
//! token this server issued and has not revoked.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Path prefix of the Books API on the mock server
pub const BOOKS_PATH: &str = "/api/v3";

/// Mock Zoho server for testing
pub struct MockZohoServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Canned behaviour of the mock
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Issued tokens are `{prefix}-1`, `{prefix}-2`, ...
    pub token_prefix: String,
    /// Lifetime reported for issued tokens; `None` omits the field
    pub expires_in: Option<u64>,
    /// Answer token requests with `{ "error": "invalid_code" }`
    pub reject_refresh: bool,
    /// Tokens the ledger answers with 401 / code 14
    pub revoked_tokens: Vec<String>,
    /// (organization id, endpoint) -> (HTTP status, body)
    pub routes: HashMap<(String, String), (u16, String)>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            token_prefix: "mock-token".to_string(),
            expires_in: Some(3600),
            reject_refresh: false,
            revoked_tokens: Vec::new(),
            routes: HashMap::new(),
            delay_ms: 0,
        }
    }
}

impl MockConfig {
    /// Answer `endpoint` for `org_id` with `status` and `body`
    pub fn route(mut self, org_id: &str, endpoint: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            (org_id.to_string(), endpoint.to_string()),
            (status, body.to_string()),
        );
        self
    }
}

#[derive(Default)]
struct MockState {
    token_hits: AtomicUsize,
    ledger_hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A request as the mock saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl MockZohoServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState::default());

        // Non-blocking so the accept loop can notice shutdown
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let state_clone = state.clone();
        let config = Arc::new(config);
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = state_clone.clone();
                        thread::spawn(move || handle_connection(stream, &cfg, &state));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(10));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Base URL to configure as the Books API
    pub fn books_url(&self) -> String {
        format!("{}{}", self.base_url(), BOOKS_PATH)
    }

    /// Base URL to configure as Zoho Accounts
    pub fn accounts_url(&self) -> String {
        self.base_url()
    }

    /// Number of token requests served
    pub fn token_hits(&self) -> usize {
        self.state.token_hits.load(Ordering::SeqCst)
    }

    /// Number of ledger requests served
    pub fn ledger_hits(&self) -> usize {
        self.state.ledger_hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockZohoServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig, state: &MockState) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, r#"{"code": 1, "message": "Invalid request"}"#);
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    if let Ok(mut requests) = state.requests.lock() {
        requests.push(request.clone());
    }

    let path = request.target.split('?').next().unwrap_or("");

    match (request.method.as_str(), path) {
        ("POST", "/oauth/v2/token") => {
            let n = state.token_hits.fetch_add(1, Ordering::SeqCst) + 1;
            if config.reject_refresh || !request.body.contains("grant_type=refresh_token") {
                send_response(&mut stream, 200, r#"{"error": "invalid_code"}"#);
                return;
            }
            let body = match config.expires_in {
                Some(secs) => format!(
                    r#"{{"access_token": "{}-{}", "api_domain": "https://www.zohoapis.com", "token_type": "Bearer", "expires_in": {}}}"#,
                    config.token_prefix, n, secs
                ),
                None => format!(r#"{{"access_token": "{}-{}"}}"#, config.token_prefix, n),
            };
            send_response(&mut stream, 200, &body);
        }
        ("GET", p) if p.starts_with(BOOKS_PATH) => {
            state.ledger_hits.fetch_add(1, Ordering::SeqCst);

            let token = request
                .authorization
                .as_deref()
                .and_then(|h| h.strip_prefix("Zoho-oauthtoken "));
            let Some(token) = token else {
                send_response(
                    &mut stream,
                    401,
                    r#"{"code": 57, "message": "You are not authorized to perform this operation"}"#,
                );
                return;
            };
            if config.revoked_tokens.iter().any(|t| t == token) {
                send_response(&mut stream, 401, r#"{"code": 14, "message": "Invalid OAuth Token"}"#);
                return;
            }

            let endpoint = p[BOOKS_PATH.len()..].trim_start_matches('/').to_string();
            let org_id = query_param(&request.target, "organization_id").unwrap_or_default();

            match config.routes.get(&(org_id, endpoint)) {
                Some((status, body)) => send_response(&mut stream, *status, body),
                None => send_response(&mut stream, 404, r#"{"code": 5, "message": "Invalid URL Passed"}"#),
            }
        }
        _ => send_response(&mut stream, 404, r#"{"code": 5, "message": "Invalid URL Passed"}"#),
    }
}

/// Read headers and a Content-Length body
fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut data = Vec::new();
    let mut buffer = [0; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        match name.trim().to_lowercase().as_str() {
            "content-length" => content_length = value.trim().parse().unwrap_or(0),
            "authorization" => authorization = Some(value.trim().to_string()),
            _ => {}
        }
    }

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }
    let body = String::from_utf8_lossy(&data[header_end..]).to_string();

    Some(RecordedRequest {
        method,
        target,
        authorization,
        body,
    })
}

fn query_param(target: &str, name: &str) -> Option<String> {
    let query = target.split_once('?')?.1;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

fn send_response(stream: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
