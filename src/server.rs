//! HTTP surface: the suggestions endpoint and the health probe.

use std::{any::Any, sync::Arc};

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    config::RelayConfig,
    core::OutingPlanner,
    error::{RelayError, Result},
    types::{OutingRequest, SuggestionSet},
};

/// State shared by every handler. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub planner: Arc<OutingPlanner>,
    pub max_field_chars: usize,
}

/// Build the router with a planner derived from `config`.
pub fn router(config: &RelayConfig) -> Result<Router> {
    router_with_planner(OutingPlanner::from_config(config), config)
}

pub fn router_with_planner(planner: OutingPlanner, config: &RelayConfig) -> Result<Router> {
    let state = AppState {
        planner: Arc::new(planner),
        max_field_chars: config.max_field_chars,
    };

    Ok(Router::new()
        .route("/api/suggestions", post(create_suggestions))
        .route("/ping", get(ping))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(cors_layer(config)?)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response)))
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    if config.api_key.is_none() {
        error!("OPENAI_API_KEY is not set; suggestion requests will fail until it is configured");
    }

    let app = router(&config)?;
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(model = %config.model, "Server started on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn create_suggestions(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<Json<SuggestionSet>, RelayError> {
    let request = OutingRequest::from_json_slice(&body, state.max_field_chars).map_err(|err| {
        info!(code = err.error_code(), "rejected request: {}", err);
        err
    })?;

    let result = state.planner.plan(&request).await.map_err(|err| {
        warn!(code = err.error_code(), "planning failed: {}", err);
        err
    })?;

    Ok(Json(result.into_suggestions()))
}

async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "now": Utc::now().timestamp_millis() }))
}

fn cors_layer(config: &RelayConfig) -> Result<CorsLayer> {
    let Some(origin) = config.cors_allow_origin.as_deref() else {
        return Ok(CorsLayer::permissive());
    };

    let origin = HeaderValue::from_str(origin).map_err(|err| {
        RelayError::Config(format!("CORS_ALLOW_ORIGIN `{origin}` is not a valid origin: {err}"))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "handler panicked".to_string()
    };

    error!(%details, "request handler panicked");
    RelayError::Unknown(details).into_response()
}
