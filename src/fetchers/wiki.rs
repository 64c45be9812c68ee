// Wikipedia-backed sectors: Education (page summary), Movies (film page
// summary), News (featured feed).

use super::{get_json, normalize, FetchContext};
use crate::envelope::Envelope;
use crate::error::RelayResult;
use serde_json::{json, Value};

pub async fn education(ctx: &FetchContext, query: &str) -> Envelope {
    normalize("Education", summary(ctx, query, "content").await)
}

pub async fn movie(ctx: &FetchContext, query: &str) -> Envelope {
    let title = format!("{} (film)", query);
    normalize("Movies", summary(ctx, &title, "description").await)
}

/// Fetch a page summary and map `extract` onto the sector's body field
/// (`content` for Education, `description` for Movies).
async fn summary(ctx: &FetchContext, title: &str, body_field: &str) -> RelayResult<Envelope> {
    let url = format!(
        "{}/{}",
        ctx.endpoints.wiki_summary,
        urlencoding::encode(title)
    );
    let data = get_json(ctx, &url).await?;
    let mut env = json!({ "success": true, "title": data["title"] });
    env[body_field] = data["extract"].clone();
    Ok(env)
}

pub async fn news(ctx: &FetchContext) -> Envelope {
    normalize("News", news_inner(ctx).await)
}

async fn news_inner(ctx: &FetchContext) -> RelayResult<Envelope> {
    // The featured feed is keyed by date: .../feed/featured/{yyyy}/{mm}/{dd}.
    let today = chrono::Utc::now().format("%Y/%m/%d");
    let url = format!(
        "{}/{}",
        ctx.endpoints.wiki_featured.trim_end_matches('/'),
        today
    );
    let data = get_json(ctx, &url).await?;

    let articles: Vec<Value> = data["news"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    json!({
                        "title": item["title"],
                        "description": item["description"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(json!({ "success": true, "articles": articles }))
}
