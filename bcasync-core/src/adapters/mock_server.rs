//! Mock HTTP server for adapter tests
//!
//! Serves canned responses per route and records every request so tests can
//! assert on what the adapters actually sent:
//! - routes match on method plus the exact path (query included), falling
//!   back to the path without its query string
//! - unmatched requests get a 404 JSON body

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

/// Canned response for one route
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "application/json".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/html".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_type: "text/plain".to_string(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A request as received by the server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Header value, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Routes = Arc<Vec<(String, String, MockResponse)>>;

/// In-process HTTP/1.1 server on a random local port
pub struct MockServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockServer {
    /// Start serving `routes` given as `(method, path, response)`
    pub fn start(routes: Vec<(&str, &str, MockResponse)>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let routes: Routes = Arc::new(
            routes
                .into_iter()
                .map(|(m, p, r)| (m.to_string(), p.to_string(), r))
                .collect(),
        );

        // Non-blocking accept so stop() can end the loop
        listener.set_nonblocking(true)?;

        let running_clone = running.clone();
        let requests_clone = requests.clone();
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let routes = routes.clone();
                        let requests = requests_clone.clone();
                        thread::spawn(move || handle_connection(stream, &routes, &requests));
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Requests whose path starts with `prefix`
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(prefix))
            .collect()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_connection(stream: TcpStream, routes: &Routes, requests: &Mutex<Vec<RecordedRequest>>) {
    // Accepted sockets may inherit the listener's non-blocking mode
    if stream.set_nonblocking(false).is_err() {
        return;
    }
    let Ok(write_half) = stream.try_clone() else {
        return;
    };
    let mut writer = write_half;
    let mut reader = BufReader::new(stream);

    let Some(request) = read_request(&mut reader) else {
        send_response(&mut writer, &MockResponse::json(400, r#"{"error":"bad request"}"#));
        return;
    };

    let path_without_query = request.path.split('?').next().unwrap_or("").to_string();
    let response = routes
        .iter()
        .find(|(m, p, _)| *m == request.method && *p == request.path)
        .or_else(|| {
            routes
                .iter()
                .find(|(m, p, _)| *m == request.method && *p == path_without_query)
        })
        .map(|(_, _, r)| r.clone())
        .unwrap_or_else(|| MockResponse::json(404, r#"{"error":"endpoint not found"}"#));

    if let Ok(mut recorded) = requests.lock() {
        recorded.push(request);
    }
    send_response(&mut writer, &response);
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<RecordedRequest> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).ok()?;

    Some(RecordedRequest {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn send_response(stream: &mut TcpStream, response: &MockResponse) {
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        status_text(response.status),
        response.content_type,
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(response.body.as_bytes());
    let _ = stream.flush();
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes_and_records() {
        let server = MockServer::start(vec![
            ("GET", "/ping", MockResponse::text("pong")),
            ("POST", "/echo", MockResponse::json(201, "{}")),
        ])
        .unwrap();
        let client = reqwest::blocking::Client::new();

        let body = client
            .get(format!("{}/ping?x=1", server.base_url()))
            .send()
            .unwrap()
            .text()
            .unwrap();
        assert_eq!(body, "pong");

        let status = client
            .post(format!("{}/echo", server.base_url()))
            .header("X-Test", "yes")
            .body("hello")
            .send()
            .unwrap()
            .status();
        assert_eq!(status.as_u16(), 201);

        let missing = client
            .get(format!("{}/nope", server.base_url()))
            .send()
            .unwrap()
            .status();
        assert_eq!(missing.as_u16(), 404);

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].path, "/ping?x=1");
        assert_eq!(requests[1].body, "hello");
        assert_eq!(requests[1].header("x-test"), Some("yes"));
    }
}
