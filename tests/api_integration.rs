use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use url::Url;

use contract_pulse::api::{app_router, AppState};
use contract_pulse::chain::PinnedHeight;
use contract_pulse::classifier::InteractionClassifier;
use contract_pulse::config::{ClassifierConfig, RequestPolicy};
use contract_pulse::explorer::HttpExplorer;
use contract_pulse::service::PopularityService;

const CONTRACT: &str = "0x1195Cf65f83B3A5768F3C496D3A05AD6412c64B7";

#[derive(Clone, Copy)]
enum ExplorerMode {
    Records(usize),
    MissingResult,
    ServerError,
}

#[derive(Clone)]
struct StubExplorer {
    mode: ExplorerMode,
    hits: Arc<AtomicUsize>,
    last_params: Arc<Mutex<Option<HashMap<String, String>>>>,
}

async fn txlist(
    State(stub): State<StubExplorer>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    *stub.last_params.lock().unwrap() = Some(params);
    match stub.mode {
        ExplorerMode::Records(n) => {
            let records: Vec<Value> = (0..n)
                .map(|i| json!({ "hash": format!("0x{:x}", i) }))
                .collect();
            (
                StatusCode::OK,
                Json(json!({ "status": "1", "message": "OK", "result": records })),
            )
        }
        ExplorerMode::MissingResult => (StatusCode::OK, Json(json!({ "status": "1" }))),
        ExplorerMode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "boom" })),
        ),
    }
}

struct TestApp {
    base_url: String,
    explorer: StubExplorer,
    handles: Vec<JoinHandle<()>>,
}

impl TestApp {
    fn explorer_hits(&self) -> usize {
        self.explorer.hits.load(Ordering::SeqCst)
    }

    fn last_params(&self) -> HashMap<String, String> {
        self.explorer
            .last_params
            .lock()
            .unwrap()
            .clone()
            .expect("explorer was not queried")
    }

    fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

async fn serve(app: Router) -> (String, JoinHandle<()>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base_url = format!("http://{}", addr);
    let server = axum::serve(listener, app);
    let handle = tokio::spawn(async move {
        let _ = server.await;
    });
    (base_url, handle)
}

async fn spawn_app(mode: ExplorerMode) -> TestApp {
    let explorer = StubExplorer {
        mode,
        hits: Arc::new(AtomicUsize::new(0)),
        last_params: Arc::new(Mutex::new(None)),
    };
    let stub_router = Router::new()
        .route("/api", get(txlist))
        .with_state(explorer.clone());
    let (explorer_url, explorer_handle) = serve(stub_router).await;

    let policy = RequestPolicy {
        timeout: Duration::from_secs(5),
        max_retries: 1,
        backoff_base_ms: 1,
    };
    let explorer_base = Url::parse(&format!("{}/api", explorer_url)).unwrap();
    let http_explorer = HttpExplorer::new(explorer_base.clone(), policy).unwrap();
    let classifier =
        InteractionClassifier::new(http_explorer, ClassifierConfig::new(CONTRACT, explorer_base));
    let state = AppState {
        engine: Arc::new(PopularityService::new(PinnedHeight(2000), classifier)),
    };
    let (base_url, app_handle) = serve(app_router(state)).await;

    TestApp {
        base_url,
        explorer,
        handles: vec![explorer_handle, app_handle],
    }
}

async fn call_rpc(app: &TestApp, method: &str) -> Value {
    let res = Client::new()
        .post(format!("{}/rpc", app.base_url))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": method }))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_endpoint_works() {
    let app = spawn_app(ExplorerMode::Records(0)).await;
    let res = Client::new()
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: Value = res.json().await.unwrap();
    assert_eq!(body.get("status").and_then(|s| s.as_str()), Some("ok"));
    app.shutdown();
}

#[tokio::test]
async fn hello_queries_last_hour_and_renders_dialog() {
    let app = spawn_app(ExplorerMode::Records(81)).await;
    let body = call_rpc(&app, "hello").await;

    assert_eq!(body["id"], 1);
    assert_eq!(body["result"]["type"], "alert");
    let children = body["result"]["content"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 9);
    assert_eq!(children[0], json!({ "type": "image", "value": "happy-high.png" }));
    assert_eq!(children[1]["value"], "Current block: **2000**");
    assert_eq!(children[2]["value"], "Popularity: **81**");
    assert_eq!(children[3]["value"], "Upvotes: ...");
    assert_eq!(children[5], json!({ "type": "divider" }));
    assert_eq!(children[7]["name"], "feedback-positive");
    assert_eq!(children[8]["variant"], "secondary");

    let params = app.last_params();
    assert_eq!(params["module"], "account");
    assert_eq!(params["action"], "txlist");
    assert_eq!(params["address"], CONTRACT);
    assert_eq!(params["startblock"], "200");
    assert_eq!(params["endblock"], "2000");
    assert_eq!(params["sort"], "desc");
    assert_eq!(params["offset"], "100");
    assert_eq!(params["page"], "0");
    app.shutdown();
}

#[tokio::test]
async fn boundary_count_stays_in_lower_tier() {
    let app = spawn_app(ExplorerMode::Records(30)).await;
    let body = call_rpc(&app, "hello").await;
    assert_eq!(body["result"]["content"]["children"][0]["value"], "happy-low.png");
    app.shutdown();
}

#[tokio::test]
async fn unknown_method_reports_method_without_querying() {
    let app = spawn_app(ExplorerMode::Records(50)).await;
    let body = call_rpc(&app, "greet").await;

    assert!(body.get("result").is_none());
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["data"], json!({ "method": "greet" }));
    assert_eq!(app.explorer_hits(), 0);
    app.shutdown();
}

#[tokio::test]
async fn missing_result_is_reported_as_malformed() {
    let app = spawn_app(ExplorerMode::MissingResult).await;
    let body = call_rpc(&app, "hello").await;

    assert_eq!(body["error"]["code"], -32603);
    assert_eq!(app.explorer_hits(), 1);
    app.shutdown();
}

#[tokio::test]
async fn server_errors_are_retried_once() {
    let app = spawn_app(ExplorerMode::ServerError).await;
    let body = call_rpc(&app, "hello").await;

    assert_eq!(body["error"]["code"], -32000);
    assert_eq!(body["error"]["data"]["status"], 500);
    assert_eq!(app.explorer_hits(), 2);
    app.shutdown();
}

#[tokio::test]
async fn transaction_insight_classifies_recipient() {
    let app = spawn_app(ExplorerMode::Records(45)).await;
    let res = Client::new()
        .post(format!("{}/transaction", app.base_url))
        .json(&json!({
            "transactionOrigin": "https://dapp.example",
            "chainId": "eip155:59144",
            "transaction": {
                "to": "0x00000000000000000000000000000000000000aa",
                "value": "0x0"
            }
        }))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["origin"], "https://dapp.example");
    assert_eq!(body["content"]["children"][0]["value"], "happy-medium.png");
    assert_eq!(body["content"]["children"][3]["value"], "Happy users: ...");
    assert_eq!(
        app.last_params()["address"],
        "0x00000000000000000000000000000000000000aa"
    );
    app.shutdown();
}

#[tokio::test]
async fn feedback_is_accepted_once() {
    let app = spawn_app(ExplorerMode::Records(0)).await;
    let client = Client::new();
    let url = format!("{}/input", app.base_url);

    let res = client
        .post(&url)
        .json(&json!({
            "event": { "type": "button_click", "name": "feedback-positive" },
            "tier": "high"
        }))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body["state"],
        json!({ "status": "feedback_recorded", "action": "positive" })
    );
    assert_eq!(body["content"]["children"][0]["value"], "happy-high.png");

    let res = client
        .post(&url)
        .json(&json!({
            "state": body["state"],
            "event": { "type": "button_click", "name": "feedback-negative" },
            "tier": "high"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(app.explorer_hits(), 0);
    app.shutdown();
}

#[tokio::test]
async fn unknown_tier_is_rejected() {
    let app = spawn_app(ExplorerMode::Records(0)).await;
    let res = Client::new()
        .post(format!("{}/input", app.base_url))
        .json(&json!({
            "event": { "type": "button_click", "name": "feedback-positive" },
            "tier": "viral"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"]["data"], json!({ "tier": "viral" }));
    app.shutdown();
}

#[tokio::test]
async fn hello_echoes_request_origin() {
    let app = spawn_app(ExplorerMode::Records(10)).await;
    let res = Client::new()
        .post(format!("{}/rpc", app.base_url))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "hello",
            "origin": "https://dapp.example"
        }))
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["id"], 7);
    assert_eq!(body["result"]["origin"], "https://dapp.example");
    assert_eq!(body["result"]["content"]["children"][3]["value"], "Upvotes: ...");
    app.shutdown();
}

#[tokio::test]
async fn unparseable_rpc_body_gets_parse_error_envelope() {
    let app = spawn_app(ExplorerMode::Records(10)).await;
    let res = Client::new()
        .post(format!("{}/rpc", app.base_url))
        .header("content-type", "text/plain")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert!(res.status().is_success());
    let body: Value = res.json().await.unwrap();

    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["id"], Value::Null);
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(app.explorer_hits(), 0);
    app.shutdown();
}
