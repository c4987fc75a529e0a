use crate::types::*;
use axum::{
    extract::{Json, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use glimpse_core::{ExtensionConfig, Result};
use glimpse_enhancer::Enhancer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

const SERVICE_NAME: &str = "glimpse-extension-api";
const DEFAULT_MAX_MEMORIES: usize = 5;
const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Clone)]
pub struct AppState {
    pub enhancer: Arc<Enhancer>,
    pub port: u16,
}

/// Build the extension API router.
pub fn create_router(enhancer: Arc<Enhancer>, config: &ExtensionConfig) -> Router {
    let state = AppState {
        enhancer,
        port: config.port,
    };

    let allowed = config.allowed_origins.clone();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| is_allowed_origin(o, &allowed))
                .unwrap_or(false)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        .route("/api/enhance", post(enhance))
        .route("/api/memories/search", get(memory_search))
        .route("/api/status", get(status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the router on the loopback interface until `token` is cancelled.
/// Never binds a non-loopback address.
pub async fn serve(
    enhancer: Arc<Enhancer>,
    config: ExtensionConfig,
    token: CancellationToken,
) -> Result<()> {
    let router = create_router(enhancer, &config);
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("extension API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    Ok(())
}

/// Browser-extension origins are allowed by prefix; anything else must be
/// explicitly configured.
fn is_allowed_origin(origin: &str, configured: &[String]) -> bool {
    origin.starts_with("chrome-extension://")
        || origin.starts_with("moz-extension://")
        || configured.iter().any(|allowed| allowed == origin)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        timestamp: Utc::now().timestamp(),
    })
}

async fn enhance(
    State(state): State<AppState>,
    Json(req): Json<EnhanceRequest>,
) -> std::result::Result<Json<EnhanceResponse>, ApiError> {
    if req.prompt.is_empty() {
        return Err(ApiError::bad_request("prompt is required"));
    }

    let max_memories = match req.max_memories {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_MAX_MEMORIES,
    };

    let result = state
        .enhancer
        .enhance(&req.prompt, &req.context, max_memories)
        .await
        .map_err(|e| {
            tracing::warn!("enhancement failed: {}", e);
            ApiError::internal("enhancement failed")
        })?;

    Ok(Json(EnhanceResponse {
        original_prompt: result.original_prompt,
        memory_count: result.memories_used.len(),
        enhanced_prompt: result.enhanced_prompt,
        memories_used: result.memories_used,
        enhancement_type: result.enhancement_type,
    }))
}

async fn memory_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> std::result::Result<Json<SearchResponse>, ApiError> {
    let query = match params.q {
        Some(q) if !q.is_empty() => q,
        _ => return Err(ApiError::bad_request("query parameter 'q' is required")),
    };

    let limit = match params.limit {
        Some(n) if n > 0 => n as usize,
        _ => DEFAULT_SEARCH_LIMIT,
    };

    let memories = state
        .enhancer
        .search_memories(&query, limit)
        .await
        .map_err(|e| {
            tracing::warn!("memory search failed: {}", e);
            ApiError::internal("search failed")
        })?;

    Ok(Json(SearchResponse {
        query,
        count: memories.len(),
        memories,
    }))
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        port: state.port,
        stats: state.enhancer.stats(),
    })
}

/// Error responses carry a short, non-leaking message.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
