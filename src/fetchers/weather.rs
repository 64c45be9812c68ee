// Weather sector — Open-Meteo current conditions + 24h temperature curve.
//
// The upstream call uses fixed London coordinates regardless of the query
// text, matching the deployed behavior; geocoding the query is out of scope.

use super::{get_json, normalize, FetchContext};
use crate::envelope::Envelope;
use crate::error::RelayResult;
use serde_json::{json, Value};

const LATITUDE: &str = "51.5074";
const LONGITUDE: &str = "-0.1278";

pub async fn current(ctx: &FetchContext) -> Envelope {
    normalize("Weather", current_inner(ctx).await)
}

async fn current_inner(ctx: &FetchContext) -> RelayResult<Envelope> {
    let url = format!(
        "{}?latitude={}&longitude={}&current_weather=true&hourly=temperature_2m",
        ctx.endpoints.weather, LATITUDE, LONGITUDE
    );
    let data = get_json(ctx, &url).await?;

    let forecast: Vec<Value> = data["hourly"]["temperature_2m"]
        .as_array()
        .map(|temps| temps.iter().take(24).cloned().collect())
        .unwrap_or_default();

    Ok(json!({
        "success": true,
        "temperature": data["current_weather"]["temperature"],
        "windspeed": data["current_weather"]["windspeed"],
        "forecast": forecast,
    }))
}
