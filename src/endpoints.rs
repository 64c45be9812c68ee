// Smile Bot Relay — HTTP endpoints
//
// The non-duplex surface: the same sector dispatch as the WebSocket path for
// single request/response exchanges, plus uploads and the two liveness
// probes. Both query endpoints share one contract: 400 with a descriptive
// envelope when required fields are absent or the sector is unknown, 200
// with the fetcher envelope as the whole body otherwise.

use crate::envelope;
use crate::error::{RelayError, RelayResult};
use crate::httpio::{self, Request};
use crate::page;
use crate::server::Relay;
use crate::upload;
use crate::ws;
use log::{info, warn};
use serde_json::json;
use std::sync::atomic::Ordering;
use tokio::io::AsyncWrite;

/// Route one parsed (non-WebSocket) request.
pub async fn route<S: AsyncWrite + Unpin>(
    stream: &mut S,
    relay: &Relay,
    req: &Request,
) -> RelayResult<()> {
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", "/") => httpio::write_html(stream, &page::build_chat_page(&relay.config.page_title)).await,
        ("GET", "/test") => capability_probe(stream, relay).await,
        ("GET", "/health") => health(stream, relay).await,
        ("POST", "/ai-response") => query_endpoint(stream, relay, req, "message").await,
        ("POST", "/advanced-search") => query_endpoint(stream, relay, req, "query").await,
        ("POST", "/upload") => upload_endpoint(stream, relay, req).await,
        ("OPTIONS", _) => httpio::write_preflight(stream).await,
        _ => {
            httpio::write_json(stream, 404, &json!({ "success": false, "error": "Not found" }))
                .await
        }
    }
}

// ── Query endpoints ────────────────────────────────────────────────────────

/// `/ai-response` reads its text from `message`, `/advanced-search` from
/// `query`; everything else is identical, including the dispatch table.
async fn query_endpoint<S: AsyncWrite + Unpin>(
    stream: &mut S,
    relay: &Relay,
    req: &Request,
    text_field: &str,
) -> RelayResult<()> {
    let body = match req.json_body() {
        Ok(v) => v,
        Err(e) => {
            return httpio::write_json(
                stream,
                400,
                &envelope::failure(&e.to_string()),
            )
            .await;
        }
    };

    let text = body[text_field].as_str().unwrap_or("").trim();
    let sector_name = body["sector"].as_str().unwrap_or("").trim();
    if text.is_empty() || sector_name.is_empty() {
        let message = format!("{} and sector are required", capitalize(text_field));
        return httpio::write_json(stream, 400, &envelope::failure(&message)).await;
    }

    if crate::sector::Sector::from_name(sector_name).is_none() {
        return httpio::write_json(stream, 400, &envelope::failure("Invalid sector")).await;
    }

    relay.message_count.fetch_add(1, Ordering::Relaxed);
    let results = ws::query_sector(relay, sector_name, text).await;
    httpio::write_json(stream, 200, &results).await
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ── Upload endpoint ────────────────────────────────────────────────────────

async fn upload_endpoint<S: AsyncWrite + Unpin>(
    stream: &mut S,
    relay: &Relay,
    req: &Request,
) -> RelayResult<()> {
    let content_type = req.header("content-type").unwrap_or("");
    if !content_type.starts_with("multipart/form-data") {
        return httpio::write_json(stream, 400, &envelope::failure("No file uploaded")).await;
    }

    let part = match upload::parse_multipart(content_type, &req.body) {
        Ok(p) => p,
        Err(RelayError::BadRequest(reason)) => {
            warn!("[upload] Rejected: {}", reason);
            return httpio::write_json(stream, 400, &envelope::failure("No file uploaded")).await;
        }
        Err(e) => return Err(e),
    };

    match relay.storage.store(&part).await {
        Ok(info) => {
            info!(
                "[upload] Stored {} ({} bytes) via {}",
                info.name, info.size, info.provider
            );
            httpio::write_json(
                stream,
                200,
                &json!({
                    "success": true,
                    "message": "File uploaded successfully",
                    "fileInfo": info,
                }),
            )
            .await
        }
        Err(e) => {
            warn!("[upload] Store failed: {}", e);
            httpio::write_json(stream, 500, &envelope::failure("Upload failed")).await
        }
    }
}

// ── Liveness probes ────────────────────────────────────────────────────────

/// Static map of which sectors are enabled. Informational only.
async fn capability_probe<S: AsyncWrite + Unpin>(
    stream: &mut S,
    relay: &Relay,
) -> RelayResult<()> {
    let mut apis = serde_json::Map::new();
    for sector in crate::sector::Sector::ALL {
        let enabled = match sector {
            crate::sector::Sector::Assistant => relay.fetch_ctx.generator_enabled(),
            _ => true,
        };
        apis.insert(sector.probe_key(), json!(enabled));
    }
    httpio::write_json(
        stream,
        200,
        &json!({
            "status": "Backend is working!",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "apis": apis,
        }),
    )
    .await
}

async fn health<S: AsyncWrite + Unpin>(stream: &mut S, relay: &Relay) -> RelayResult<()> {
    httpio::write_json(
        stream,
        200,
        &json!({
            "status": "ok",
            "uptime": relay.started_at.elapsed().as_secs(),
            "connections": relay.connections.lock().len(),
        }),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("message"), "Message");
        assert_eq!(capitalize("query"), "Query");
        assert_eq!(capitalize(""), "");
    }
}
