// Smile Bot Relay — server core
//
// One TCP listener serves everything: the chat page, the JSON endpoints,
// uploads, and WebSocket upgrades. Each accepted connection gets its own
// task; the request is read once, then either replayed into the WebSocket
// handshake or answered as plain HTTP. Optional TLS (PEM cert + key) wraps
// the same listener for HTTPS/WSS.

use crate::config::RelayConfig;
use crate::endpoints;
use crate::error::{RelayError, RelayResult};
use crate::fetchers::{Endpoints, FetchContext};
use crate::httpio;
use crate::upload::StorageBackend;
use crate::ws::{self, PrefixedStream};
use log::{info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::BufReader as StdBufReader;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;

// ── Stream abstraction ─────────────────────────────────────────────────────

pub trait ChatStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> ChatStream for T {}

// ── Shared state ───────────────────────────────────────────────────────────

/// Everything a connection handler needs, shared by `Arc`. Queries share no
/// mutable state with each other; the counter is the only thing written
/// after startup.
pub struct Relay {
    pub config: RelayConfig,
    pub fetch_ctx: FetchContext,
    pub storage: StorageBackend,
    pub message_count: AtomicU64,
    /// Ids of currently open duplex channels, for the health probe and logs.
    pub connections: Mutex<HashSet<uuid::Uuid>>,
    pub started_at: Instant,
}

impl Relay {
    pub fn new(config: RelayConfig) -> RelayResult<Arc<Relay>> {
        Self::with_endpoints(config, Endpoints::default())
    }

    /// Tests use this to point the fetchers at mock upstreams.
    pub fn with_endpoints(config: RelayConfig, endpoints: Endpoints) -> RelayResult<Arc<Relay>> {
        let fetch_ctx = FetchContext::with_endpoints(&config, endpoints)?;
        let storage = StorageBackend::from_config(&config, fetch_ctx.client.clone());
        Ok(Arc::new(Relay {
            config,
            fetch_ctx,
            storage,
            message_count: AtomicU64::new(0),
            connections: Mutex::new(HashSet::new()),
            started_at: Instant::now(),
        }))
    }
}

// ── TLS (optional) ─────────────────────────────────────────────────────────

/// Build a TLS acceptor from PEM cert+key files, or `None` if not configured.
fn build_tls_acceptor(config: &RelayConfig) -> RelayResult<Option<tokio_rustls::TlsAcceptor>> {
    let (Some(cert_path), Some(key_path)) = (&config.tls_cert_path, &config.tls_key_path) else {
        return Ok(None);
    };

    let cert_file = std::fs::File::open(cert_path)
        .map_err(|e| RelayError::Config(format!("Open TLS cert {}: {}", cert_path, e)))?;
    let certs: Vec<_> = rustls_pemfile::certs(&mut StdBufReader::new(cert_file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RelayError::Config(format!("Parse TLS cert: {}", e)))?;

    let key_file = std::fs::File::open(key_path)
        .map_err(|e| RelayError::Config(format!("Open TLS key {}: {}", key_path, e)))?;
    let key = rustls_pemfile::private_key(&mut StdBufReader::new(key_file))
        .map_err(|e| RelayError::Config(format!("Parse TLS key: {}", e)))?
        .ok_or_else(|| RelayError::Config("No private key found in PEM file".into()))?;

    let tls_config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| RelayError::Config(format!("TLS config: {}", e)))?;

    Ok(Some(tokio_rustls::TlsAcceptor::from(Arc::new(tls_config))))
}

// ── Accept loop ────────────────────────────────────────────────────────────

/// Bind and serve forever. A bind failure (port already in use) is fatal to
/// startup and propagates to `main`.
pub async fn run(relay: Arc<Relay>) -> RelayResult<()> {
    let addr = format!("{}:{}", relay.config.bind_address, relay.config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        RelayError::Config(format!("Bind {} failed (port in use?): {}", addr, e))
    })?;
    serve(relay, listener).await
}

pub async fn serve(relay: Arc<Relay>, listener: TcpListener) -> RelayResult<()> {
    let tls_acceptor = build_tls_acceptor(&relay.config)?.map(Arc::new);
    let scheme = if tls_acceptor.is_some() { "https" } else { "http" };
    let addr = listener.local_addr()?;
    info!("[relay] Listening on {}://{}", scheme, addr);

    if relay.config.bind_address != "127.0.0.1"
        && relay.config.bind_address != "localhost"
        && tls_acceptor.is_none()
    {
        warn!(
            "[relay] Binding to {} without TLS — traffic crosses the network in plaintext",
            relay.config.bind_address
        );
    }

    loop {
        let (tcp_stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("[relay] Accept error: {}", e);
                continue;
            }
        };

        let relay = relay.clone();
        let tls = tls_acceptor.clone();
        tokio::spawn(async move {
            let stream: Box<dyn ChatStream> = if let Some(acceptor) = tls {
                match acceptor.accept(tcp_stream).await {
                    Ok(tls_stream) => Box::new(tls_stream),
                    Err(e) => {
                        warn!("[relay] TLS handshake failed from {}: {}", peer, e);
                        return;
                    }
                }
            } else {
                Box::new(tcp_stream)
            };

            if let Err(e) = handle_connection(stream, relay).await {
                warn!("[relay] Connection error from {}: {}", peer, e);
            }
        });
    }
}

// ── Connection handler ─────────────────────────────────────────────────────

async fn handle_connection(mut stream: Box<dyn ChatStream>, relay: Arc<Relay>) -> RelayResult<()> {
    let req = match httpio::read_request(&mut stream).await {
        Ok(req) => req,
        Err(RelayError::BadRequest(reason)) => {
            // Best-effort 400; the peer may already be gone.
            let _ = httpio::write_json(
                &mut stream,
                400,
                &crate::envelope::failure(&reason),
            )
            .await;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if req.is_websocket_upgrade() && req.path == "/ws" {
        let prefixed = PrefixedStream::new(req.raw, stream);
        return ws::handle_websocket(prefixed, relay).await;
    }

    endpoints::route(&mut stream, &relay, &req).await
}
