//! HTTP surface: `GET /chat_stream` (SSE) and `GET /health`.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::chat::ChatService;
use crate::config::ScoutConfig;
use crate::error::ScoutError;

#[derive(Debug, Deserialize)]
pub struct ChatStreamParams {
    pub message: Option<String>,
    pub checkpoint_id: Option<String>,
}

/// Router with CORS for `origins` applied.
pub fn router(service: ChatService, origins: &[String]) -> Router {
    Router::new()
        .route("/chat_stream", get(chat_stream))
        .route("/health", get(health))
        .layer(cors_layer(origins))
        .with_state(service)
}

/// Bind `config.bind_addr` and serve until the process exits.
pub async fn serve(config: &ScoutConfig, service: ChatService) -> Result<(), ScoutError> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| {
            ScoutError::Configuration(format!("failed to bind {}: {e}", config.bind_addr))
        })?;
    info!(addr = %config.bind_addr, model = %config.model, "listening");
    axum::serve(listener, router(service, &config.cors_origins))
        .await
        .map_err(|e| ScoutError::Stream(format!("server error: {e}")))
}

async fn chat_stream(
    State(service): State<ChatService>,
    Query(params): Query<ChatStreamParams>,
) -> Response {
    let message = match params.message {
        Some(message) if !message.trim().is_empty() => message,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "message is required" })),
            )
                .into_response()
        }
    };
    let frames = service
        .stream_chat(message, params.checkpoint_id)
        .map(|event| Ok::<_, Infallible>(event.to_sse_frame()));
    sse_response(frames)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn sse_response<S>(stream: S) -> Response
where
    S: Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    // Wildcards cannot be combined with credentials, so methods and headers
    // mirror the preflight request.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
