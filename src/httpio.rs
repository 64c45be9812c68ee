// Smile Bot Relay — minimal HTTP/1.1 plumbing
//
// The relay serves its handful of routes and the WebSocket upgrade from one
// TCP listener, reading requests directly off the stream. This module owns
// the request reader (header scan, Content-Length body read, size caps) and
// the hand-formatted response writers. The raw bytes consumed while reading
// are kept so a WebSocket upgrade can be replayed into the handshake.

use crate::error::{RelayError, RelayResult};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Cap on the header block.
const MAX_HEADER_BYTES: usize = 64 * 1024;
/// Cap on a request body (uploads included).
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

// ── Request ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Request {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Every byte consumed from the stream, for WebSocket handshake replay.
    pub raw: Vec<u8>,
}

impl Request {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_websocket_upgrade(&self) -> bool {
        self.header("upgrade")
            .map(|v| v.eq_ignore_ascii_case("websocket"))
            .unwrap_or(false)
    }

    pub fn json_body(&self) -> RelayResult<Value> {
        serde_json::from_slice(&self.body).map_err(|e| {
            RelayError::BadRequest(format!("invalid JSON body: {}", e))
        })
    }
}

/// Read one request off the stream: header block first, then as much body as
/// Content-Length promises. WebSocket upgrades carry no body, so their `raw`
/// is exactly the handshake bytes tungstenite needs to see again.
pub async fn read_request<S: AsyncRead + Unpin>(stream: &mut S) -> RelayResult<Request> {
    let mut raw: Vec<u8> = Vec::with_capacity(2048);
    let mut chunk = [0u8; 4096];

    // Header block
    let header_end = loop {
        if let Some(pos) = find_header_end(&raw) {
            break pos;
        }
        if raw.len() > MAX_HEADER_BYTES {
            return Err(RelayError::BadRequest("header block too large".into()));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RelayError::BadRequest("connection closed mid-request".into()));
        }
        raw.extend_from_slice(&chunk[..n]);
    };

    let header_text = String::from_utf8_lossy(&raw[..header_end]).into_owned();
    let mut lines = header_text.lines();
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_ascii_uppercase();
    let target = parts.next().unwrap_or("/");
    let path = target.split('?').next().unwrap_or("/").to_string();
    if method.is_empty() {
        return Err(RelayError::BadRequest("empty request line".into()));
    }

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    if content_length > MAX_BODY_BYTES {
        return Err(RelayError::BadRequest("body too large".into()));
    }

    let body_start = header_end + 4;
    let mut body: Vec<u8> = raw[body_start.min(raw.len())..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(RelayError::BadRequest("connection closed mid-body".into()));
        }
        raw.extend_from_slice(&chunk[..n]);
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    Ok(Request {
        method,
        path,
        headers,
        body,
        raw,
    })
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

// ── Response writers ───────────────────────────────────────────────────────

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "OK",
    }
}

async fn write_response<S: AsyncWrite + Unpin>(
    stream: &mut S,
    status: u16,
    content_type: &str,
    body: &[u8],
) -> RelayResult<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        content_type,
        body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn write_json<S: AsyncWrite + Unpin>(
    stream: &mut S,
    status: u16,
    body: &Value,
) -> RelayResult<()> {
    write_response(stream, status, "application/json", body.to_string().as_bytes()).await
}

pub async fn write_html<S: AsyncWrite + Unpin>(stream: &mut S, html: &str) -> RelayResult<()> {
    write_response(stream, 200, "text/html; charset=utf-8", html.as_bytes()).await
}

/// CORS preflight answer (the deployed original sat behind a permissive
/// CORS middleware).
pub async fn write_preflight<S: AsyncWrite + Unpin>(stream: &mut S) -> RelayResult<()> {
    let head = "HTTP/1.1 204 No Content\r\nAccess-Control-Allow-Origin: *\r\nAccess-Control-Allow-Methods: GET, POST, OPTIONS\r\nAccess-Control-Allow-Headers: Content-Type\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
    stream.write_all(head.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}
