use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ai_bootstrap::AiRuntime;
use crate::analyze::ai_adapter::{AiError, ChatMessage, DynGateway, StructuredCompletion};
use crate::analyze::feed_agent::analyze_feed_with_ai;
use crate::analyze::incident::{extraction_messages, incident_schema};
use crate::config::ai::ModelDefaults;
use crate::ingest::{read_feed, FeedError, FeedFetcher, FeedItem, FeedRegistry, FeedSource};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<FeedRegistry>,
    pub fetcher: FeedFetcher,
    pub openrouter: DynGateway,
    pub cerebras: DynGateway,
    pub models: Arc<ModelDefaults>,
}

impl AppState {
    pub fn new(registry: FeedRegistry, fetcher: FeedFetcher, ai: &AiRuntime) -> Self {
        Self {
            registry: Arc::new(registry),
            fetcher,
            openrouter: ai.openrouter.clone(),
            cerebras: ai.cerebras.clone(),
            models: Arc::new(ai.cfg.models.clone()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/openrouter-chat", post(openrouter_chat))
        .route("/api/cerebral-chat", post(cerebral_chat))
        .route("/api/german-police-feeds", get(german_police_feeds))
        .route("/api/custom-rss", get(custom_rss))
        .route("/api/analyze-rss-feed", post(analyze_rss_feed))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

const MSG_BAD_MESSAGES: &str = "Missing or invalid messages array";
const MSG_MISSING_MODEL: &str = "Missing model";
const MSG_BAD_URL_PARAM: &str = "Missing or invalid URL parameter";
const MSG_BAD_URL_FORMAT: &str = "Invalid URL format";
const MSG_BAD_DESCRIPTION: &str = "Missing or invalid feed description";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

impl ApiError {
    fn invalid(msg: &str) -> Self {
        ApiError::Validation(msg.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Feed(_) | ApiError::Ai(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rej: JsonRejection) -> Self {
        ApiError::Validation(rej.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ------------------------------------------------------------
// Request helpers
// ------------------------------------------------------------

fn take_messages(body: &mut Map<String, Value>) -> Result<Vec<ChatMessage>, ApiError> {
    match body.remove("messages") {
        Some(v @ Value::Array(_)) => {
            serde_json::from_value(v).map_err(|_| ApiError::invalid(MSG_BAD_MESSAGES))
        }
        _ => Err(ApiError::invalid(MSG_BAD_MESSAGES)),
    }
}

fn take_model(body: &mut Map<String, Value>) -> Result<String, ApiError> {
    match body.remove("model") {
        Some(Value::String(m)) if !m.trim().is_empty() => Ok(m),
        _ => Err(ApiError::invalid(MSG_MISSING_MODEL)),
    }
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match body? {
        Json(Value::Object(map)) => Ok(map),
        // Non-object JSON has no messages to speak of.
        Json(_) => Ok(Map::new()),
    }
}

/// Short, non-reversible id for correlating logs without recording the text.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

async fn openrouter_chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StructuredCompletion>, ApiError> {
    let mut body = object_body(body)?;
    let messages = take_messages(&mut body)?;
    let model = take_model(&mut body)?;
    tracing::info!(%model, messages = messages.len(), "structured chat request");

    let out = state
        .openrouter
        .complete_structured(&extraction_messages(&messages), &model, &incident_schema())
        .await?;
    Ok(Json(out))
}

async fn cerebral_chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut body = object_body(body)?;
    let messages = take_messages(&mut body)?;
    let model = take_model(&mut body)?;
    // Whatever is left are completion options.
    let options = body;
    tracing::info!(
        %model,
        messages = messages.len(),
        options = ?options.keys().collect::<Vec<_>>(),
        "chat request"
    );

    let out = state
        .cerebras
        .complete_with_options(&messages, &model, &options)
        .await?;
    Ok(Json(out))
}

async fn german_police_feeds(State(state): State<AppState>) -> Json<Vec<FeedSource>> {
    let feeds = state.registry.feeds().to_vec();
    tracing::info!(count = feeds.len(), "listing police feeds");
    Json(feeds)
}

async fn custom_rss(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Result<Json<Vec<FeedItem>>, ApiError> {
    let url = q
        .get("url")
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::invalid(MSG_BAD_URL_PARAM))?;
    let parsed = reqwest::Url::parse(url).map_err(|_| ApiError::invalid(MSG_BAD_URL_FORMAT))?;

    let items = read_feed(&state.fetcher, parsed.as_str()).await?;
    Ok(Json(items))
}

async fn analyze_rss_feed(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let body = object_body(body)?;
    let description = match body.get("feedDescription") {
        Some(Value::String(d)) if !d.is_empty() => d.as_str(),
        _ => return Err(ApiError::invalid(MSG_BAD_DESCRIPTION)),
    };
    tracing::info!(
        desc_id = %anon_hash(description),
        len = description.len(),
        "analyzing feed description"
    );

    let out =
        analyze_feed_with_ai(state.openrouter.as_ref(), description, &state.models.tools).await?;
    Ok(Json(out))
}
