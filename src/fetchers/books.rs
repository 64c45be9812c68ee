// Books sector — Open Library title search, first five hits.

use super::{get_json, normalize, FetchContext};
use crate::envelope::{miss, Envelope};
use crate::error::RelayResult;
use serde_json::{json, Value};

pub async fn search(ctx: &FetchContext, query: &str) -> Envelope {
    normalize("Books", search_inner(ctx, query).await)
}

async fn search_inner(ctx: &FetchContext, query: &str) -> RelayResult<Envelope> {
    let url = format!(
        "{}?q={}&limit=5",
        ctx.endpoints.books,
        urlencoding::encode(query)
    );
    let data = get_json(ctx, &url).await?;

    let docs = data["docs"].as_array().filter(|docs| !docs.is_empty());
    let Some(docs) = docs else {
        return Ok(miss("No books found"));
    };

    let books: Vec<Value> = docs
        .iter()
        .map(|book| {
            json!({
                "title": book["title"],
                "author": book["author_name"][0].as_str().unwrap_or("Unknown"),
                "year": book["first_publish_year"],
            })
        })
        .collect();

    Ok(json!({ "success": true, "books": books }))
}
