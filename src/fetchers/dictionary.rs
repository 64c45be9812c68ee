// Dictionary sector — dictionaryapi.dev word lookup.

use super::{get_json, normalize, FetchContext};
use crate::envelope::{miss, Envelope};
use crate::error::RelayResult;
use serde_json::{json, Value};

pub async fn define(ctx: &FetchContext, word: &str) -> Envelope {
    normalize("Dictionary", define_inner(ctx, word).await)
}

async fn define_inner(ctx: &FetchContext, word: &str) -> RelayResult<Envelope> {
    let url = format!("{}/{}", ctx.endpoints.dictionary, urlencoding::encode(word));
    let data = get_json(ctx, &url).await?;

    let Some(entry) = data.as_array().and_then(|entries| entries.first()) else {
        return Ok(miss(format!("No definition found for \"{}\"", word)));
    };

    let meanings: Vec<Value> = entry["meanings"]
        .as_array()
        .map(|meanings| meanings.iter().map(map_meaning).collect())
        .unwrap_or_default();

    Ok(json!({
        "success": true,
        "word": entry["word"].as_str().unwrap_or(word),
        "phonetic": entry["phonetic"].as_str().unwrap_or(""),
        "meanings": meanings,
    }))
}

fn map_meaning(meaning: &Value) -> Value {
    let definitions: Vec<Value> = meaning["definitions"]
        .as_array()
        .map(|defs| {
            defs.iter()
                .map(|def| {
                    json!({
                        "definition": def["definition"].as_str().unwrap_or(""),
                        "example": def["example"].as_str(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "partOfSpeech": meaning["partOfSpeech"].as_str().unwrap_or(""),
        "definitions": definitions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_meaning_keeps_missing_example_null() {
        let meaning = json!({
            "partOfSpeech": "adjective",
            "definitions": [
                { "definition": "lasting a very short time" },
                { "definition": "transitory", "example": "ephemeral pleasures" }
            ]
        });
        let mapped = map_meaning(&meaning);
        assert_eq!(mapped["partOfSpeech"], "adjective");
        assert!(mapped["definitions"][0]["example"].is_null());
        assert_eq!(mapped["definitions"][1]["example"], "ephemeral pleasures");
    }
}
