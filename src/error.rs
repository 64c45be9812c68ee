// ── Smile Bot Relay: Error Types ───────────────────────────────────────────
// Single canonical error enum for the relay, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, network, config…).
//   • `#[from]` wires std/external error conversions automatically.
//   • Fetcher failures never escape the fetcher layer as `RelayError`;
//     they are downgraded to the uniform failure envelope there. This enum
//     covers everything else: startup, connection I/O, malformed requests.
//   • No variant carries upstream response bodies in its message.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RelayError {
    /// Filesystem or socket-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP / network failure (reqwest layer).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// WebSocket protocol failure (tungstenite layer).
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Relay configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound HTTP request could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upload storage backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── Migration bridge: String → RelayError ──────────────────────────────────
// Allows `?` on helpers still returning `Result<T, String>`.

impl From<String> for RelayError {
    fn from(s: String) -> Self {
        RelayError::Other(s)
    }
}

impl From<&str> for RelayError {
    fn from(s: &str) -> Self {
        RelayError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All relay operations should return this type.
pub type RelayResult<T> = Result<T, RelayError>;
