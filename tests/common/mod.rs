//! In-process stand-in for the partner-orders API and the Slack webhook.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path as UrlPath, RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};
use tempfile::TempDir;

use orderprobe::config::ProbeConfig;

pub const CUSTOMER_DOC: &str = "503.961.710-01";
pub const BASIC_BLOB: &str = "Y2xpZW50OnNlY3JldA==";
pub const ACCESS_TOKEN: &str = "tok-123";
pub const SCHEMA_NAME: &str = "Agrofel-JSONSCHEMA-5.2.3";
pub const REPORT_URL: &str = "https://reports.example.com/agrofel/";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Canned responses; tweak fields before `MockApi::start`.
#[derive(Debug, Clone)]
pub struct Behavior {
    pub token_status: u16,
    pub token_body: Value,
    pub list_status: u16,
    pub list_body: Value,
    pub detail_status: u16,
    pub detail_body: Value,
    pub slack_status: u16,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            token_status: 200,
            token_body: json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "bearer",
                "expires_in": 3599,
                "scope": "trust"
            }),
            list_status: 200,
            list_body: order_list(),
            detail_status: 200,
            detail_body: order_detail(7002),
            slack_status: 200,
        }
    }
}

struct Shared {
    behavior: Behavior,
    calls: Mutex<Vec<RecordedCall>>,
    slack_messages: Mutex<Vec<Value>>,
}

pub struct MockApi {
    pub base_url: String,
    shared: Arc<Shared>,
}

impl MockApi {
    pub async fn start(behavior: Behavior) -> Self {
        let shared = Arc::new(Shared {
            behavior,
            calls: Mutex::new(Vec::new()),
            slack_messages: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/partnerOrders/list/store", get(list))
            .route("/partnerOrders/store/order/:id", get(detail))
            .route("/slack", post(slack))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            shared,
        }
    }

    /// API calls in arrival order (Slack excluded).
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }

    pub fn slack_messages(&self) -> Vec<Value> {
        self.shared.slack_messages.lock().unwrap().clone()
    }

    pub fn slack_url(&self) -> String {
        format!("{}/slack", self.base_url)
    }
}

fn record(shared: &Shared, method: &str, path: String, query: Option<String>, headers: &HeaderMap, body: String) {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    shared.calls.lock().unwrap().push(RecordedCall {
        method: method.to_string(),
        path,
        query,
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body,
    });
}

fn reply(status: u16, body: Value) -> impl IntoResponse {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, axum::Json(body))
}

async fn token(State(shared): State<Arc<Shared>>, headers: HeaderMap, body: String) -> impl IntoResponse {
    record(&shared, "POST", "/oauth/token".into(), None, &headers, body);
    reply(shared.behavior.token_status, shared.behavior.token_body.clone())
}

async fn list(
    State(shared): State<Arc<Shared>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(&shared, "GET", "/partnerOrders/list/store".into(), query, &headers, String::new());
    reply(shared.behavior.list_status, shared.behavior.list_body.clone())
}

async fn detail(
    State(shared): State<Arc<Shared>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    record(
        &shared,
        "GET",
        format!("/partnerOrders/store/order/{id}"),
        None,
        &headers,
        String::new(),
    );
    reply(shared.behavior.detail_status, shared.behavior.detail_body.clone())
}

async fn slack(State(shared): State<Arc<Shared>>, axum::Json(message): axum::Json<Value>) -> impl IntoResponse {
    shared.slack_messages.lock().unwrap().push(message);
    let status = StatusCode::from_u16(shared.behavior.slack_status).unwrap_or(StatusCode::OK);
    (status, "ok")
}

/// Three orders of the test customer (7002 is the newest) and one of
/// somebody else that is newer still.
pub fn order_list() -> Value {
    json!([
        {"orderId": 7001, "dateCreated": "2026-09-01T10:00:00Z", "customer": {"customerDocument": CUSTOMER_DOC}},
        {"orderId": 9999, "dateCreated": "2026-10-17T10:00:00Z", "customer": {"customerDocument": "000.000.000-00"}},
        {"orderId": 7002, "dateCreated": "2026-10-01T08:30:00Z", "customer": {"customerDocument": CUSTOMER_DOC}},
        {"orderId": 7000, "dateCreated": "2026-08-15T12:00:00Z", "customer": {"customerDocument": CUSTOMER_DOC}}
    ])
}

pub fn order_detail(order_id: i64) -> Value {
    json!({
        "orderId": order_id,
        "status": "APPROVED",
        "partnerOrderAttributes": [
            {"name": "safra", "value": "2026/2027"}
        ],
        "items": [{
            "sku": "AGR-001",
            "quantity": 2,
            "priceContractSkuCustomAttributes": [
                {"name": "contrato", "value": "CT-88"}
            ]
        }],
        "paymentDateVpvf": "2026-11-30"
    })
}

pub fn order_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["orderId", "partnerOrderAttributes", "items", "paymentDateVpvf"],
        "properties": {
            "orderId": {"type": ["integer", "string"]},
            "partnerOrderAttributes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "value"],
                    "properties": {"name": {"type": "string"}, "value": {"type": "string"}}
                }
            },
            "items": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["sku", "priceContractSkuCustomAttributes"],
                    "properties": {
                        "sku": {"type": "string"},
                        "priceContractSkuCustomAttributes": {"type": "array"}
                    }
                }
            },
            "paymentDateVpvf": {"type": ["string", "null"]}
        }
    })
}

/// Config pointing every stage at `api` and every directory into `dir`.
pub fn config_for(api: &MockApi, dir: &TempDir) -> ProbeConfig {
    write_schema(dir.path());

    let mut config = ProbeConfig::default();
    config.api.base_url = format!("{}/", api.base_url);
    config.api.customer_doc = CUSTOMER_DOC.into();
    config.api.run_id = Some("4242".into());
    config.auth.basic = Some(BASIC_BLOB.into());
    config.auth.username = Some("qa-bot".into());
    config.auth.password = Some("p@ss word".into());
    config.schema.dir = dir.path().join("schemas");
    config.schema.name = SCHEMA_NAME.into();
    config.http.timeout_secs = 5;
    config.report.results_dir = dir.path().join("results");
    config.report.report_dir = dir.path().join("report");
    config.report.sync_delay_secs = 0;
    config.slack.webhook_url = Some(api.slack_url());
    config.slack.report_url = Some(REPORT_URL.into());
    config
}

fn write_schema(root: &Path) {
    let dir = root.join("schemas");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join(format!("{SCHEMA_NAME}.json")),
        serde_json::to_string_pretty(&order_schema()).unwrap(),
    )
    .unwrap();
}
