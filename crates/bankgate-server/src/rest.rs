//! REST surface of the gateway
//!
//! Legacy LCD-style bank transfer endpoints plus read-only key listing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bankgate_keyring::{KeyInfo, KeyringError};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::warn;

use crate::config::ServerConfig;
use crate::pipeline::{PipelineResponse, SendPipeline, SendRequestSource};

/// Shared handler state
pub struct RestState {
    pub pipeline: SendPipeline,
}

impl RestState {
    pub fn new(pipeline: SendPipeline) -> Self {
        Self { pipeline }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: status.as_u16(),
        }),
    )
        .into_response()
}

/// Public view of a stored key
#[derive(Serialize)]
pub struct KeyOutput {
    pub name: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub address: String,
    pub pubkey: bankgate_crypto::PublicKey,
}

impl KeyOutput {
    fn new(info: KeyInfo, prefix: &str) -> Result<Self, Response> {
        let address = info
            .address
            .to_bech32(prefix)
            .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e))?;
        Ok(Self {
            name: info.name,
            key_type: info.pubkey.key_type().to_string(),
            address,
            pubkey: info.pubkey,
        })
    }
}

/// Adapts one HTTP request to the pipeline's input contract
struct HttpSendRequest {
    address: String,
    query: HashMap<String, String>,
    body: Bytes,
}

impl SendRequestSource for HttpSendRequest {
    fn address_param(&self) -> &str {
        &self.address
    }

    fn flag(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    fn body(&self) -> &[u8] {
        &self.body
    }
}

fn into_http(response: PipelineResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

pub fn create_rest_router(state: Arc<RestState>, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/bank/accounts/:address/transfers", post(send_coins))
        .route("/bank/:address/send", post(send_coins))
        .route("/keys", get(list_keys))
        .route("/keys/:name", get(show_key))
        .route("/health", get(health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_seconds,
        )))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );

    if config.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any)
                .max_age(Duration::from_secs(86400)),
        );
    }

    router
        .layer(RequestBodyLimitLayer::new(config.max_request_size))
        .with_state(state)
}

async fn send_coins(
    State(state): State<Arc<RestState>>,
    Path(address): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let request = HttpSendRequest {
        address,
        query,
        body,
    };
    into_http(state.pipeline.handle(&request).await)
}

async fn list_keys(State(state): State<Arc<RestState>>) -> Response {
    let keys = match state.pipeline.keyring().list_keys().await {
        Ok(keys) => keys,
        Err(e) => {
            warn!(error = %e, "failed to list keys");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e);
        }
    };

    let prefix = state.pipeline.bech32_prefix();
    match keys
        .into_iter()
        .map(|info| KeyOutput::new(info, prefix))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(keys) => Json(keys).into_response(),
        Err(response) => response,
    }
}

async fn show_key(State(state): State<Arc<RestState>>, Path(name): Path<String>) -> Response {
    match state.pipeline.keyring().get_key(&name).await {
        Ok(info) => match KeyOutput::new(info, state.pipeline.bech32_prefix()) {
            Ok(key) => Json(key).into_response(),
            Err(response) => response,
        },
        Err(e @ KeyringError::KeyNotFound(_)) => error_response(StatusCode::NOT_FOUND, e),
        Err(e @ KeyringError::InvalidName(_)) => error_response(StatusCode::BAD_REQUEST, e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "bankgate",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
