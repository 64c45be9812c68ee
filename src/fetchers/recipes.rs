// Recipes sector — TheMealDB meal search.

use super::{get_json, normalize, FetchContext};
use crate::envelope::{miss, Envelope};
use crate::error::RelayResult;
use serde_json::{json, Value};

pub async fn search(ctx: &FetchContext, query: &str) -> Envelope {
    normalize("Recipes", search_inner(ctx, query).await)
}

async fn search_inner(ctx: &FetchContext, query: &str) -> RelayResult<Envelope> {
    let url = format!("{}?s={}", ctx.endpoints.recipes, urlencoding::encode(query));
    let data = get_json(ctx, &url).await?;

    // The upstream returns `{"meals": null}` on no match, not an empty array.
    let meals = data["meals"].as_array().filter(|meals| !meals.is_empty());
    let Some(meals) = meals else {
        return Ok(miss("No recipes found"));
    };

    let recipes: Vec<Value> = meals
        .iter()
        .map(|meal| {
            json!({
                "name": meal["strMeal"],
                "category": meal["strCategory"],
                "instructions": meal["strInstructions"],
            })
        })
        .collect();

    Ok(json!({ "success": true, "recipes": recipes }))
}
