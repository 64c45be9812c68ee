// End-to-end tests: a relay bound to an ephemeral port, fetchers pointed at
// canned-response mock upstreams, and real WebSocket / HTTP clients.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use smilebot_relay::config::RelayConfig;
use smilebot_relay::envelope::SERVICE_UNAVAILABLE;
use smilebot_relay::fetchers::{self, Endpoints, FetchContext};
use smilebot_relay::sector::Sector;
use smilebot_relay::server::{self, Relay};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

// ── Mock upstream ──────────────────────────────────────────────────────────

/// Serve canned JSON per path prefix; unmatched paths get a 404.
async fn spawn_mock(routes: Vec<(&str, u16, Value)>) -> SocketAddr {
    let routes: Arc<Vec<(String, u16, Value)>> = Arc::new(
        routes
            .into_iter()
            .map(|(p, s, b)| (p.to_string(), s, b))
            .collect(),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                let Ok(req) = smilebot_relay::httpio::read_request(&mut stream).await else {
                    return;
                };
                let (status, body) = routes
                    .iter()
                    .find(|(prefix, _, _)| req.path.starts_with(prefix.as_str()))
                    .map(|(_, s, b)| (*s, b.clone()))
                    .unwrap_or((404, json!({})));
                let _ = smilebot_relay::httpio::write_json(&mut stream, status, &body).await;
            });
        }
    });
    addr
}

/// Accepts connections and never answers, for timeout tests.
async fn spawn_black_hole() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

fn mock_endpoints(base: &str) -> Endpoints {
    Endpoints {
        dictionary: format!("{base}/dict"),
        weather: format!("{base}/weather"),
        activity: format!("{base}/activity"),
        quote: format!("{base}/quote"),
        wiki_summary: format!("{base}/summary"),
        wiki_featured: format!("{base}/featured"),
        books: format!("{base}/books"),
        recipes: format!("{base}/recipes"),
    }
}

fn canned_routes() -> Vec<(&'static str, u16, Value)> {
    vec![
        (
            "/dict",
            200,
            json!([{
                "word": "ephemeral",
                "phonetic": "/ɪˈfɛm(ə)ɹəl/",
                "meanings": [{
                    "partOfSpeech": "adjective",
                    "definitions": [{ "definition": "lasting a very short time" }]
                }]
            }]),
        ),
        (
            "/weather",
            200,
            json!({
                "current_weather": { "temperature": 15.2, "windspeed": 11.0 },
                "hourly": { "temperature_2m": (0..30).map(|i| i as f64).collect::<Vec<f64>>() }
            }),
        ),
        (
            "/activity",
            200,
            json!({ "activity": "Learn origami", "type": "recreational" }),
        ),
        ("/quote", 200, json!({ "content": "Be curious.", "author": "Ada" })),
        (
            "/summary",
            200,
            json!({ "title": "Blue whale", "extract": "The blue whale is..." }),
        ),
        (
            "/featured",
            200,
            json!({ "news": [{ "title": "Headline", "description": "Body" }] }),
        ),
        (
            "/books",
            200,
            json!({ "docs": [{ "title": "Dune", "author_name": ["Frank Herbert"], "first_publish_year": 1965 }] }),
        ),
        (
            "/recipes",
            200,
            json!({ "meals": [{ "strMeal": "Pasta", "strCategory": "Main", "strInstructions": "Boil." }] }),
        ),
        ("/gen/api/generate", 200, json!({ "response": "hello there" })),
    ]
}

// ── Relay under test ───────────────────────────────────────────────────────

async fn start_relay(mut config: RelayConfig, endpoints: Endpoints) -> (SocketAddr, Arc<Relay>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.port = addr.port();
    let relay = Relay::with_endpoints(config, endpoints).unwrap();
    tokio::spawn(server::serve(relay.clone(), listener));
    (addr, relay)
}

/// Relay wired to a full set of mocked upstreams, generator included.
async fn start_mocked_relay() -> (SocketAddr, Arc<Relay>) {
    let mock = spawn_mock(canned_routes()).await;
    let base = format!("http://{}", mock);
    let config = RelayConfig {
        generator_url: Some(format!("{base}/gen")),
        ..Default::default()
    };
    start_relay(config, mock_endpoints(&base)).await
}

async fn ws_connect(
    addr: SocketAddr,
) -> tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
> {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .unwrap();
    ws
}

async fn recv_json<S>(ws: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let msg = tokio::time::timeout(std::time::Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for server message")
        .expect("stream ended")
        .expect("websocket error");
    serde_json::from_str(msg.to_text().unwrap()).unwrap()
}

// ── Duplex channel ─────────────────────────────────────────────────────────

#[tokio::test]
async fn ws_every_known_sector_yields_one_response() {
    let (addr, _relay) = start_mocked_relay().await;
    let mut ws = ws_connect(addr).await;

    let greeting = recv_json(&mut ws).await;
    assert_eq!(greeting["type"], "connection_status");
    assert_eq!(greeting["status"], "connected");

    for sector in Sector::ALL {
        let query = json!({ "type": "ai_query", "query": "blue whale", "sector": sector.name() });
        ws.send(Message::Text(query.to_string())).await.unwrap();
        let reply = recv_json(&mut ws).await;
        assert_eq!(reply["type"], "ai_response", "sector {}", sector);
        assert!(
            reply["results"]["success"].is_boolean(),
            "sector {} envelope missing success: {}",
            sector,
            reply["results"]
        );
    }
}

#[tokio::test]
async fn ws_malformed_input_gets_error_and_connection_survives() {
    let (addr, _relay) = start_mocked_relay().await;
    let mut ws = ws_connect(addr).await;
    let _greeting = recv_json(&mut ws).await;

    ws.send(Message::Text("not json at all".into())).await.unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");

    ws.send(Message::Text(
        json!({ "type": "something_else", "x": 1 }).to_string(),
    ))
    .await
    .unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "error");

    // Still usable afterwards.
    ws.send(Message::Text(
        json!({ "type": "ai_query", "query": "ada", "sector": "Wellbeing" }).to_string(),
    ))
    .await
    .unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "ai_response");
    assert_eq!(reply["results"]["success"], true);
}

#[tokio::test]
async fn ws_unknown_sector_rejected_with_failure_envelope() {
    let (addr, _relay) = start_mocked_relay().await;
    let mut ws = ws_connect(addr).await;
    let _greeting = recv_json(&mut ws).await;

    ws.send(Message::Text(
        json!({ "type": "ai_query", "query": "verse", "sector": "Bible" }).to_string(),
    ))
    .await
    .unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["type"], "ai_response");
    assert_eq!(reply["results"]["success"], false);
    assert!(reply["results"]["error"]
        .as_str()
        .unwrap()
        .contains("No handler for sector"));
}

#[tokio::test]
async fn reconnect_receives_fresh_connection_status() {
    let (addr, _relay) = start_mocked_relay().await;

    let mut ws = ws_connect(addr).await;
    assert_eq!(recv_json(&mut ws).await["type"], "connection_status");
    ws.close(None).await.unwrap();

    // A new connection (the client's reconnect) is greeted again.
    let mut ws = ws_connect(addr).await;
    assert_eq!(recv_json(&mut ws).await["type"], "connection_status");
}

// ── Fetcher contract ───────────────────────────────────────────────────────

async fn mocked_ctx(routes: Vec<(&str, u16, Value)>) -> FetchContext {
    let mock = spawn_mock(routes).await;
    let config = RelayConfig::default();
    FetchContext::with_endpoints(&config, mock_endpoints(&format!("http://{}", mock))).unwrap()
}

#[tokio::test]
async fn education_summary_maps_title_and_content() {
    let ctx = mocked_ctx(canned_routes()).await;
    let env = fetchers::dispatch(&ctx, Sector::Education, "blue whale").await;
    assert_eq!(
        env,
        json!({ "success": true, "title": "Blue whale", "content": "The blue whale is..." })
    );
}

#[tokio::test]
async fn dictionary_upstream_404_is_service_unavailable() {
    let ctx = mocked_ctx(vec![("/dict", 404, json!({ "title": "No Definitions Found" }))]).await;
    let env = fetchers::dispatch(&ctx, Sector::Dictionary, "ephemeral").await;
    assert_eq!(env, json!({ "success": false, "error": SERVICE_UNAVAILABLE }));
}

#[tokio::test]
async fn fetchers_are_pure_given_upstream_response() {
    let ctx = mocked_ctx(canned_routes()).await;
    for sector in [Sector::Dictionary, Sector::Books, Sector::Recipes, Sector::News] {
        let first = fetchers::dispatch(&ctx, sector, "dune").await;
        let second = fetchers::dispatch(&ctx, sector, "dune").await;
        assert_eq!(
            first.to_string(),
            second.to_string(),
            "sector {} not idempotent",
            sector
        );
    }
}

#[tokio::test]
async fn hung_upstream_times_out_to_service_unavailable() {
    let hole = spawn_black_hole().await;
    let config = RelayConfig {
        fetch_timeout_secs: 1,
        ..Default::default()
    };
    let ctx =
        FetchContext::with_endpoints(&config, mock_endpoints(&format!("http://{}", hole))).unwrap();
    let env = fetchers::dispatch(&ctx, Sector::Wellbeing, "").await;
    assert_eq!(env, json!({ "success": false, "error": SERVICE_UNAVAILABLE }));
}

#[tokio::test]
async fn empty_upstream_result_is_a_soft_miss() {
    let ctx = mocked_ctx(vec![
        ("/books", 200, json!({ "docs": [] })),
        ("/recipes", 200, json!({ "meals": null })),
    ])
    .await;
    let env = fetchers::dispatch(&ctx, Sector::Books, "zzz").await;
    assert_eq!(env, json!({ "success": false, "message": "No books found" }));
    let env = fetchers::dispatch(&ctx, Sector::Recipes, "zzz").await;
    assert_eq!(env, json!({ "success": false, "message": "No recipes found" }));
}

// ── HTTP endpoints ─────────────────────────────────────────────────────────

#[tokio::test]
async fn http_query_endpoints_share_the_dispatch_table() {
    let (addr, _relay) = start_mocked_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/ai-response", addr))
        .json(&json!({ "message": "pasta", "sector": "Recipes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["recipes"][0]["name"], "Pasta");

    let resp = client
        .post(format!("http://{}/advanced-search", addr))
        .json(&json!({ "query": "pasta", "sector": "Recipes" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // Envelope returned directly, no extra wrapper.
    assert_eq!(body["success"], true);
    assert!(body.get("result").is_none());
}

#[tokio::test]
async fn http_unknown_sector_is_400_without_leaking_an_envelope() {
    let (addr, _relay) = start_mocked_relay().await;
    let client = reqwest::Client::new();

    for (path, field) in [("ai-response", "message"), ("advanced-search", "query")] {
        let resp = client
            .post(format!("http://{}/{}", addr, path))
            .json(&json!({ field: "x", "sector": "Funwhile" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid sector");
    }
}

#[tokio::test]
async fn http_missing_fields_is_400() {
    let (addr, _relay) = start_mocked_relay().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{}/ai-response", addr))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("http://{}/ai-response", addr))
        .json(&json!({ "message": "   ", "sector": "Weather" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn probes_report_capabilities_and_uptime() {
    let mock = spawn_mock(canned_routes()).await;
    // No generator configured: assistant must be reported disabled.
    let config = RelayConfig::default();
    let (addr, _relay) = start_relay(config, mock_endpoints(&format!("http://{}", mock))).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .get(format!("http://{}/test", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "Backend is working!");
    assert_eq!(body["apis"]["education"], true);
    assert_eq!(body["apis"]["dictionary"], true);
    assert_eq!(body["apis"]["assistant"], false);

    let body: Value = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["uptime"].is_number());
    assert_eq!(body["connections"], 0);
}

#[tokio::test]
async fn chat_page_is_served_at_root() {
    let (addr, _relay) = start_mocked_relay().await;
    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let page = resp.text().await.unwrap();
    assert!(page.contains("ai_query"));
}

// ── Uploads ────────────────────────────────────────────────────────────────

fn multipart_request(filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "testboundary42";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}

#[tokio::test]
async fn upload_size_round_trip_local_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mock = spawn_mock(canned_routes()).await;
    let config = RelayConfig {
        upload_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    let (addr, _relay) = start_relay(config, mock_endpoints(&format!("http://{}", mock))).await;

    let payload = vec![0xabu8; 4321];
    let (content_type, body) = multipart_request("blob.bin", &payload);
    let resp = reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .header("content-type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["fileInfo"]["size"], 4321);
    assert_eq!(body["fileInfo"]["name"], "blob.bin");
    assert_eq!(body["fileInfo"]["provider"], "local");

    let stored = std::fs::read(body["fileInfo"]["path"].as_str().unwrap()).unwrap();
    assert_eq!(stored.len(), 4321);
}

#[tokio::test]
async fn upload_size_round_trip_remote_backend() {
    let store = spawn_mock(vec![("/store/", 200, json!({}))]).await;
    let mock = spawn_mock(canned_routes()).await;
    let config = RelayConfig {
        remote_storage_url: Some(format!("http://{}/store", store)),
        ..Default::default()
    };
    let (addr, _relay) = start_relay(config, mock_endpoints(&format!("http://{}", mock))).await;

    let payload = vec![0x5au8; 777];
    let (content_type, body) = multipart_request("photo.png", &payload);
    let resp = reqwest::Client::new()
        .post(format!("http://{}/upload", addr))
        .header("content-type", content_type)
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["fileInfo"]["size"], 777);
    assert_eq!(body["fileInfo"]["provider"], "remote");
    assert!(body["fileInfo"]["url"]
        .as_str()
        .unwrap()
        .contains("/store/file-"));
}

#[tokio::test]
async fn upload_without_file_is_400() {
    let (addr, _relay) = start_mocked_relay().await;
    let client = reqwest::Client::new();

    // Wrong content type entirely.
    let resp = client
        .post(format!("http://{}/upload", addr))
        .json(&json!({ "file": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Multipart with no file part.
    let boundary = "b";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = boundary
    );
    let resp = client
        .post(format!("http://{}/upload", addr))
        .header("content-type", format!("multipart/form-data; boundary={}", boundary))
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No file uploaded");
}
