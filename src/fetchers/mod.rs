// Smile Bot Relay — Fetchers
//
// One stateless fetcher per sector. Each wraps exactly one outbound HTTP
// call and normalizes both success and failure into an envelope; callers
// never observe a raw error from a fetcher. The dispatch table below is the
// single source of truth shared by the duplex handler and both HTTP query
// endpoints, and every call runs under a bounded timeout whose expiry
// produces the same `Service unavailable` envelope as any other upstream
// failure.

pub mod activity;
pub mod books;
pub mod dictionary;
pub mod generator;
pub mod quote;
pub mod recipes;
pub mod weather;
pub mod wiki;

use crate::config::RelayConfig;
use crate::envelope::{self, Envelope};
use crate::error::{RelayError, RelayResult};
use crate::sector::Sector;
use serde_json::Value;
use std::time::Duration;

// ── Upstream endpoints ─────────────────────────────────────────────────────

/// Base URLs for every upstream service. Defaults are the real public APIs;
/// tests point them at local mocks.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// `GET {dictionary}/{word}`
    pub dictionary: String,
    /// `GET {weather}?latitude=…&longitude=…&current_weather=true&hourly=temperature_2m`
    pub weather: String,
    /// `GET {activity}`
    pub activity: String,
    /// `GET {quote}`
    pub quote: String,
    /// `GET {wiki_summary}/{title}`
    pub wiki_summary: String,
    /// `GET {wiki_featured}/{yyyy}/{mm}/{dd}`
    pub wiki_featured: String,
    /// `GET {books}?q={query}&limit=5`
    pub books: String,
    /// `GET {recipes}?s={query}`
    pub recipes: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            dictionary: "https://api.dictionaryapi.dev/api/v2/entries/en".into(),
            weather: "https://api.open-meteo.com/v1/forecast".into(),
            activity: "https://www.boredapi.com/api/activity".into(),
            quote: "https://api.quotable.io/random".into(),
            wiki_summary: "https://en.wikipedia.org/api/rest_v1/page/summary".into(),
            wiki_featured: "https://en.wikipedia.org/api/rest_v1/feed/featured/".into(),
            books: "https://openlibrary.org/search.json".into(),
            recipes: "https://www.themealdb.com/api/json/v1/1/search.php".into(),
        }
    }
}

// ── Fetch context ──────────────────────────────────────────────────────────

/// Generator settings for the Assistant sector.
#[derive(Debug, Clone)]
pub struct Generator {
    pub url: String,
    pub model: String,
}

/// Shared, immutable context handed to every fetcher call: one pooled
/// client, the endpoint table, and the per-call deadline.
#[derive(Debug, Clone)]
pub struct FetchContext {
    pub client: reqwest::Client,
    pub endpoints: Endpoints,
    pub timeout: Duration,
    pub generator: Option<Generator>,
}

impl FetchContext {
    pub fn new(config: &RelayConfig) -> RelayResult<Self> {
        Self::with_endpoints(config, Endpoints::default())
    }

    pub fn with_endpoints(config: &RelayConfig, endpoints: Endpoints) -> RelayResult<Self> {
        let timeout = config.fetch_timeout();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let generator = config.generator_url.as_ref().map(|url| Generator {
            url: url.trim_end_matches('/').to_string(),
            model: config.generator_model.clone(),
        });
        Ok(FetchContext {
            client,
            endpoints,
            timeout,
            generator,
        })
    }

    pub fn generator_enabled(&self) -> bool {
        self.generator.is_some()
    }
}

// ── Dispatch ───────────────────────────────────────────────────────────────

/// Route a query to its sector's fetcher. Always yields an envelope: the
/// fetchers normalize their own failures, and the timeout wrapper here
/// converts a hung upstream into the standard failure envelope.
pub async fn dispatch(ctx: &FetchContext, sector: Sector, query: &str) -> Envelope {
    let fetch = async {
        match sector {
            Sector::Education => wiki::education(ctx, query).await,
            Sector::Dictionary => dictionary::define(ctx, query).await,
            Sector::Weather => weather::current(ctx).await,
            Sector::Entertainment => activity::random(ctx).await,
            Sector::Wellbeing => quote::random(ctx).await,
            Sector::News => wiki::news(ctx).await,
            Sector::Books => books::search(ctx, query).await,
            Sector::Recipes => recipes::search(ctx, query).await,
            Sector::Movies => wiki::movie(ctx, query).await,
            Sector::Assistant => generator::complete(ctx, query).await,
        }
    };
    match tokio::time::timeout(ctx.timeout, fetch).await {
        Ok(env) => env,
        Err(_) => {
            log::warn!("[fetch] {} query timed out after {:?}", sector, ctx.timeout);
            envelope::service_unavailable()
        }
    }
}

// ── Shared upstream helpers ────────────────────────────────────────────────

/// One GET, decoded as JSON. Any non-2xx status is an error; the caller's
/// downgrade wrapper turns it into the uniform failure envelope.
pub(crate) async fn get_json(ctx: &FetchContext, url: &str) -> RelayResult<Value> {
    let resp = ctx.client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(RelayError::Other(format!("upstream returned {}", status)));
    }
    Ok(resp.json::<Value>().await?)
}

/// Downgrade a fetcher result to the uniform failure envelope, logging the
/// actual cause server-side only.
pub(crate) fn normalize(sector: &str, result: RelayResult<Envelope>) -> Envelope {
    match result {
        Ok(env) => env,
        Err(e) => {
            log::warn!("[fetch] {} upstream failed: {}", sector, e);
            envelope::service_unavailable()
        }
    }
}
