//! Minimal threaded HTTP/1.1 server for integration tests.
//!
//! Each connection reads one request, asks the route function for a reply
//! and writes it (optionally after a delay). The server runs until the
//! process exits.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Parsed request line.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub method: String,
    /// Path plus query, e.g. `/items?page=2`.
    pub target: String,
}

impl Incoming {
    /// Value of query parameter `name`, if present.
    pub fn query(&self, name: &str) -> Option<String> {
        let (_, query) = self.target.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| v.to_string())
        })
    }
}

/// What to send back.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        delay: Duration,
    },
    /// Close the connection without writing anything.
    Hangup,
    /// Send a 200 status line and headers announcing `declared` body bytes,
    /// write only `sent`, keep the connection open for `stall`, then close.
    Truncated {
        declared: usize,
        sent: Vec<u8>,
        stall: Duration,
    },
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn json(status: u16, body: &str) -> Self {
        Reply::Respond {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn truncated(declared: usize, sent: &str, stall: Duration) -> Self {
        Reply::Truncated {
            declared,
            sent: sent.as_bytes().to_vec(),
            stall,
        }
    }

    pub fn after(mut self, wait: Duration) -> Self {
        if let Reply::Respond { delay, .. } = &mut self {
            *delay = wait;
        }
        self
    }
}

/// Running server: base URL plus a count of requests served.
#[derive(Clone)]
pub struct TestServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// `url` joined with `path` (which must start with `/`).
    pub fn at(&self, path: &str) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), path)
    }
}

/// Start a server whose replies come from `route`.
pub fn start<F>(route: F) -> TestServer
where
    F: Fn(&Incoming) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let route = Arc::new(route);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let route = Arc::clone(&route);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                if let Some(incoming) = read_request(&stream) {
                    counter.fetch_add(1, Ordering::SeqCst);
                    write_reply(stream, route(&incoming));
                }
            });
        }
    });
    TestServer {
        url: format!("http://127.0.0.1:{}/", port),
        hits,
    }
}

/// A URL on which nothing is listening.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn read_request(mut stream: &TcpStream) -> Option<Incoming> {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let text = String::from_utf8_lossy(&buf);
    let mut first = text.lines().next()?.split_whitespace();
    Some(Incoming {
        method: first.next()?.to_string(),
        target: first.next()?.to_string(),
    })
}

fn write_reply(mut stream: TcpStream, reply: Reply) {
    let (status, headers, body, delay) = match reply {
        Reply::Respond {
            status,
            headers,
            body,
            delay,
        } => (status, headers, body, delay),
        Reply::Hangup => return,
        Reply::Truncated {
            declared,
            sent,
            stall,
        } => {
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&sent);
            let _ = stream.flush();
            thread::sleep(stall);
            return;
        }
    };
    thread::sleep(delay);
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        status,
        reason(status),
        body.len()
    );
    for (k, v) in headers {
        head.push_str(&format!("{}: {}\r\n", k, v));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
