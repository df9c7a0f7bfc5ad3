//! Canned HTTP replies for unit tests.

use super::http::{ApiRequest, ApiResponse, HttpSend};
use super::Result;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

pub fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        url: String::new(),
        headers: BTreeMap::new(),
        body: body.to_owned(),
    }
}

/// Replies with queued responses in order and records every request.
pub struct StubSender {
    responses: RefCell<VecDeque<ApiResponse>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl StubSender {
    pub fn new(responses: Vec<ApiResponse>) -> StubSender {
        StubSender {
            responses: RefCell::new(responses.into_iter().collect()),
            requests: RefCell::new(vec![]),
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl HttpSend for StubSender {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.borrow_mut().push(request.clone());
        let mut reply = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no reply queued for {} {}", request.method, request.url));
        if reply.url.is_empty() {
            reply.url = request.url.clone();
        }
        Ok(reply)
    }
}

lazy_static! {
    static ref ENV_LOCK: Mutex<()> = Mutex::new(());
}

/// Serializes tests that read or write process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Accepts one HTTP connection on a local port, answers `{}` and hands back
/// the raw request text. Returns the `http://127.0.0.1:<port>` base URL.
pub fn serve_once() -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        while !request_complete(&raw) {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }
        stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}")
            .unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    });
    (base, handle)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let head_end = match text.find("\r\n\r\n") {
        Some(i) => i + 4,
        None => return false,
    };
    let head = text[..head_end].to_lowercase();
    if head.contains("transfer-encoding: chunked") {
        return text.ends_with("0\r\n\r\n");
    }
    let length = head
        .lines()
        .find(|l| l.starts_with("content-length:"))
        .and_then(|l| l["content-length:".len()..].trim().parse::<usize>().ok())
        .unwrap_or(0);
    raw.len() >= head_end + length
}

/// Values of every `Content-Type` header in a raw request.
pub fn content_types(raw: &str) -> Vec<String> {
    raw.split("\r\n\r\n")
        .next()
        .unwrap_or("")
        .lines()
        .filter(|l| l.to_lowercase().starts_with("content-type:"))
        .map(|l| l["content-type:".len()..].trim().to_owned())
        .collect()
}
