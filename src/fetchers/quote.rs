// Wellbeing sector — Quotable random quote.

use super::{get_json, normalize, FetchContext};
use crate::envelope::Envelope;
use crate::error::RelayResult;
use serde_json::json;

pub async fn random(ctx: &FetchContext) -> Envelope {
    normalize("Wellbeing", random_inner(ctx).await)
}

async fn random_inner(ctx: &FetchContext) -> RelayResult<Envelope> {
    let data = get_json(ctx, &ctx.endpoints.quote).await?;
    Ok(json!({
        "success": true,
        "quote": data["content"],
        "author": data["author"],
    }))
}
