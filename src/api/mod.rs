use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::{codes, PulseError};
use crate::service::{self, PopularityEngine, RpcRequest};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn PopularityEngine>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Debug, Serialize)]
struct ErrorObject {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl From<&PulseError> for ErrorObject {
    fn from(err: &PulseError) -> Self {
        Self {
            code: err.rpc_code(),
            message: err.rpc_message().to_string(),
            data: err.rpc_data(),
        }
    }
}

#[derive(Deserialize)]
struct JsonRpcEnvelope {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    origin: Option<String>,
}

#[derive(Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorObject>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

fn envelope_failure(code: i64, message: &str, reason: String) -> Json<JsonRpcResponse> {
    Json(JsonRpcResponse::failure(
        Value::Null,
        ErrorObject {
            code,
            message: message.to_string(),
            data: Some(serde_json::json!({ "reason": reason })),
        },
    ))
}

/// JSON-RPC 2.0 transport for the explicit request handler. Errors travel in
/// the response body, so the HTTP status is always 200, unparseable bodies
/// included.
async fn rpc(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => return envelope_failure(codes::PARSE_ERROR, "Parse error", e.to_string()),
    };
    let envelope: JsonRpcEnvelope = match serde_json::from_value(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return envelope_failure(codes::INVALID_REQUEST, "Invalid request", e.to_string())
        }
    };

    let request = RpcRequest {
        method: envelope.method,
        origin: envelope.origin,
    };
    let response = match service::on_rpc_request(state.engine.as_ref(), &request).await {
        Ok(notification) => match serde_json::to_value(notification) {
            Ok(result) => JsonRpcResponse::success(envelope.id, result),
            Err(e) => {
                let err = PulseError::MalformedResponse(format!("unserializable dialog: {}", e));
                JsonRpcResponse::failure(envelope.id, ErrorObject::from(&err))
            }
        },
        Err(err) => {
            tracing::warn!("rpc {} failed: {}", request.method, err);
            JsonRpcResponse::failure(envelope.id, ErrorObject::from(&err))
        }
    };
    Json(response)
}

pub struct ApiError(PulseError);

impl From<PulseError> for ApiError {
    fn from(err: PulseError) -> Self {
        Self(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorObject,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PulseError::UnknownRequestMethod { .. } => StatusCode::NOT_FOUND,
            PulseError::InvalidParams(_) | PulseError::InvalidTier(_) => StatusCode::BAD_REQUEST,
            PulseError::FeedbackAlreadyRecorded => StatusCode::CONFLICT,
            PulseError::QueryFailed { .. } | PulseError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        };
        if status.is_server_error() {
            tracing::warn!("request failed: {}", self.0);
        }
        let body = ErrorBody {
            error: ErrorObject::from(&self.0),
        };
        (status, Json(body)).into_response()
    }
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError(PulseError::InvalidParams(e.to_string())))
}

async fn transaction(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<crate::dialog::Notification>, ApiError> {
    let event: service::TransactionEvent = parse_body(body)?;
    let notification = service::on_transaction(state.engine.as_ref(), &event).await?;
    Ok(Json(notification))
}

async fn user_input(Json(body): Json<Value>) -> Result<Json<service::UserInputOutcome>, ApiError> {
    let request: service::UserInputRequest = parse_body(body)?;
    Ok(Json(service::on_user_input(&request)?))
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc", post(rpc))
        .route("/transaction", post(transaction))
        .route("/input", post(user_input))
        .with_state(state)
}

pub async fn run_http_server(addr: &str, state: AppState) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
