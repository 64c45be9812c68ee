// Smile Bot Relay — duplex channel handler
//
// The HTTP router reads the upgrade request before it knows the connection
// is a WebSocket, so the handshake bytes are replayed through
// `PrefixedStream` for tungstenite. Per connection: an opaque id (logging
// only), one `connection_status` greeting, then an `ai_query` loop. The
// server never reconnects a closed channel; Closed is terminal here and
// reconnection is entirely the client's job.

use crate::envelope::{self, Envelope};
use crate::error::RelayResult;
use crate::fetchers;
use crate::sector::Sector;
use crate::server::Relay;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::pin::Pin;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_tungstenite::tungstenite::Message as WsMessage;

// ── Prefixed Stream (replays buffered bytes then delegates) ────────────────

pub struct PrefixedStream<S> {
    prefix: Vec<u8>,
    pos: usize,
    inner: S,
}

impl<S> PrefixedStream<S> {
    pub fn new(prefix: Vec<u8>, inner: S) -> Self {
        Self { prefix, pos: 0, inner }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for PrefixedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        if this.pos < this.prefix.len() {
            let remaining = &this.prefix[this.pos..];
            let n = remaining.len().min(buf.remaining());
            buf.put_slice(&remaining[..n]);
            this.pos += n;
            return Poll::Ready(Ok(()));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for PrefixedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }
    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }
    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

// ── Channel handler ────────────────────────────────────────────────────────

pub async fn handle_websocket<S>(stream: S, relay: Arc<Relay>) -> RelayResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut sender, mut receiver) = ws_stream.split();

    let conn_id = uuid::Uuid::new_v4();

    let greeting = json!({
        "type": "connection_status",
        "status": "connected",
        "message": format!("Connected to {}", relay.config.page_title),
    });
    sender
        .send(WsMessage::Text(greeting.to_string().into()))
        .await?;

    let open = {
        let mut conns = relay.connections.lock();
        conns.insert(conn_id);
        conns.len()
    };
    info!("[ws] Client connected (id: {}, {} open)", conn_id, open);

    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("[ws] Receive error on {}: {}", conn_id, e);
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => {
                let reply = handle_text(&relay, conn_id, text.as_ref()).await;
                if sender
                    .send(WsMessage::Text(reply.to_string().into()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
            WsMessage::Ping(data) => {
                let _ = sender.send(WsMessage::Pong(data)).await;
            }
            WsMessage::Close(_) => {
                info!("[ws] Client {} disconnected", conn_id);
                break;
            }
            _ => {}
        }
    }

    relay.connections.lock().remove(&conn_id);
    Ok(())
}

/// Process one inbound text frame and produce the outbound message. Every
/// dispatch-level problem (bad JSON, unknown type, missing fields) becomes a
/// `{type:"error"}` message and the connection stays open.
async fn handle_text(relay: &Relay, conn_id: uuid::Uuid, text: &str) -> Value {
    let data: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("[ws] Bad JSON from {}: {}", conn_id, e);
            return error_message();
        }
    };

    if data["type"] != "ai_query" {
        warn!("[ws] Unknown message type from {}: {}", conn_id, data["type"]);
        return error_message();
    }

    let query = data["query"].as_str().unwrap_or("").trim();
    let sector_name = data["sector"].as_str().unwrap_or("");
    if query.is_empty() {
        return error_message();
    }

    relay.message_count.fetch_add(1, Ordering::Relaxed);
    let preview: String = query.chars().take(80).collect();
    debug!("[ws] {} query in {}: {}", conn_id, sector_name, preview);

    let results = query_sector(relay, sector_name, query).await;
    json!({ "type": "ai_response", "results": results })
}

/// The one dispatch path: unknown sectors are rejected with a failure
/// envelope rather than falling through to the text-generation model.
pub async fn query_sector(relay: &Relay, sector_name: &str, query: &str) -> Envelope {
    match Sector::from_name(sector_name) {
        Some(sector) => fetchers::dispatch(&relay.fetch_ctx, sector, query).await,
        None => envelope::failure(&format!("No handler for sector \"{}\"", sector_name)),
    }
}

fn error_message() -> Value {
    json!({ "type": "error", "message": "Error processing your request" })
}
