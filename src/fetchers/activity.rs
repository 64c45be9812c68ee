// Entertainment sector — Bored API random activity suggestion.

use super::{get_json, normalize, FetchContext};
use crate::envelope::Envelope;
use crate::error::RelayResult;
use serde_json::json;

pub async fn random(ctx: &FetchContext) -> Envelope {
    normalize("Entertainment", random_inner(ctx).await)
}

async fn random_inner(ctx: &FetchContext) -> RelayResult<Envelope> {
    let data = get_json(ctx, &ctx.endpoints.activity).await?;
    Ok(json!({
        "success": true,
        "activity": data["activity"],
        "type": data["type"],
    }))
}
