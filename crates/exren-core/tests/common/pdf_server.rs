//! Minimal HTTP/1.1 server for integration tests.
//!
//! Answers every GET with the same body and, optionally, a
//! `Content-Disposition` header. Paths are ignored, so any document URL under
//! the base works.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Default)]
pub struct PdfServerOptions {
    /// Sent verbatim as the `Content-Disposition` value.
    pub content_disposition: Option<String>,
}

/// Starts a server in a background thread serving `body`. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, PdfServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: PdfServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &body, &opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: &PdfServerOptions) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let method = std::str::from_utf8(&buf[..n])
        .ok()
        .and_then(|r| r.split_whitespace().next())
        .unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    let disposition = opts
        .content_disposition
        .as_deref()
        .map(|v| format!("Content-Disposition: {}\r\n", v))
        .unwrap_or_default();
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        body.len(),
        disposition
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}
