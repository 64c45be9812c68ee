// Smile Bot Relay
//
// A single-process chat relay: the browser talks to us over one duplex
// WebSocket (plus a few plain HTTP endpoints), and every query is routed by
// its sector label to one stateless fetcher wrapping one public API.
//
// Layout:
//   - config     — RelayConfig (TOML file + env overrides)
//   - error      — RelayError / RelayResult
//   - envelope   — the uniform {success, …} response shape
//   - sector     — the closed sector enum
//   - fetchers   — one module per upstream + the single dispatch table
//   - httpio     — raw HTTP/1.1 request reader and response writers
//   - server     — listener, TLS, per-connection routing, shared state
//   - ws         — the duplex channel handler
//   - endpoints  — /ai-response, /advanced-search, /upload, /test, /health
//   - upload     — multipart parsing + local/remote storage backends
//   - page       — the embedded chat page (client Session Controller)

pub mod config;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod fetchers;
pub mod httpio;
pub mod page;
pub mod sector;
pub mod server;
pub mod upload;
pub mod ws;
