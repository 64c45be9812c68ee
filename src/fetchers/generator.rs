// Assistant sector — local text-generation model.
//
// One POST to a configured Ollama-style `/api/generate` endpoint. The
// generator is optional: when no endpoint is configured the sector answers
// with a failure envelope instead of being silently absent, so the chat page
// and the capability probe stay in agreement.

use super::{normalize, FetchContext};
use crate::envelope::{failure, Envelope};
use crate::error::{RelayError, RelayResult};
use serde_json::{json, Value};

pub const UNAVAILABLE: &str = "Text generation unavailable";

pub async fn complete(ctx: &FetchContext, prompt: &str) -> Envelope {
    let Some(generator) = &ctx.generator else {
        return failure(UNAVAILABLE);
    };
    normalize("Assistant", complete_inner(ctx, generator, prompt).await)
}

async fn complete_inner(
    ctx: &FetchContext,
    generator: &super::Generator,
    prompt: &str,
) -> RelayResult<Envelope> {
    let url = format!("{}/api/generate", generator.url);
    let resp = ctx
        .client
        .post(&url)
        .json(&json!({
            "model": generator.model,
            "prompt": prompt,
            "stream": false,
        }))
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(RelayError::Other(format!("generator returned {}", status)));
    }

    let data: Value = resp.json().await?;
    let reply = data["response"].as_str().unwrap_or("").trim().to_string();
    Ok(json!({ "success": true, "reply": reply }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;

    #[tokio::test]
    async fn test_unconfigured_generator_fails_cleanly() {
        let ctx = FetchContext::new(&RelayConfig::default()).unwrap();
        let env = complete(&ctx, "hello").await;
        assert_eq!(env["success"], false);
        assert_eq!(env["error"], UNAVAILABLE);
    }
}
