//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed route table; unknown paths get 404. Responses carry
//! `Connection: close` so each request uses its own connection, which lets
//! the in-flight gauge approximate concurrently outstanding requests. The
//! gauge is decremented just before the response is written, so a client
//! that has seen a response observes the slot as already released.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// Artificial service delay, to force request overlap.
    pub delay: Duration,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Route {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct MockServer {
    base_url: String,
    peak: Arc<AtomicUsize>,
}

impl MockServer {
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:43012`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Highest number of simultaneously in-flight requests seen so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Starts a server in a background thread serving `routes` (path → response).
/// The server runs until the process exits.
pub fn start(routes: HashMap<String, Route>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let accept_in_flight = Arc::clone(&in_flight);
    let accept_peak = Arc::clone(&peak);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let in_flight = Arc::clone(&accept_in_flight);
            let peak = Arc::clone(&accept_peak);
            thread::spawn(move || handle(stream, &routes, &in_flight, &peak));
        }
    });

    MockServer {
        base_url: format!("http://127.0.0.1:{}", port),
        peak,
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    in_flight: &AtomicUsize,
    peak: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    peak.fetch_max(current, Ordering::SeqCst);

    let (status, body, delay) = match routes.get(path) {
        Some(route) => (route.status, route.body.clone(), route.delay),
        None => (404, b"not found".to_vec(), Duration::ZERO),
    };
    if !delay.is_zero() {
        thread::sleep(delay);
    }

    in_flight.fetch_sub(1, Ordering::SeqCst);
    respond(&mut stream, status, &body);
}

fn respond(stream: &mut TcpStream, status: u16, body: &[u8]) {
    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
