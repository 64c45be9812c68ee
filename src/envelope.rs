// Smile Bot Relay — Response Envelopes
//
// Every fetcher normalizes its upstream result into an envelope: a JSON
// object with a mandatory boolean `success` field. Success envelopes carry
// fetcher-specific fields (there is deliberately no shared schema beyond the
// discriminator); failure envelopes carry `error` or `message`.

use serde_json::{json, Value};

/// The uniform failure text for any upstream problem: non-2xx status,
/// transport error, decode error, or timeout. The specific cause is logged
/// server-side, never surfaced to the client.
pub const SERVICE_UNAVAILABLE: &str = "Service unavailable";

/// An envelope is a plain JSON object; fetchers build theirs with `json!`.
pub type Envelope = Value;

/// `{success:false, error:<text>}` — hard failure.
pub fn failure(error: &str) -> Envelope {
    json!({ "success": false, "error": error })
}

/// The standard upstream-failure envelope.
pub fn service_unavailable() -> Envelope {
    failure(SERVICE_UNAVAILABLE)
}

/// `{success:false, message:<text>}` — the upstream answered cleanly but had
/// nothing for this query (soft miss, e.g. no dictionary entry).
pub fn miss(message: impl Into<String>) -> Envelope {
    json!({ "success": false, "message": message.into() })
}

/// True when the envelope has `success: true`.
pub fn is_success(envelope: &Envelope) -> bool {
    envelope["success"].as_bool().unwrap_or(false)
}

/// True when the envelope carries any boolean `success` discriminator.
pub fn has_discriminator(envelope: &Envelope) -> bool {
    envelope["success"].is_boolean()
}
