use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

use crate::error::HotnessError;
use crate::item::RawItem;
use crate::metrics::prometheus_handle;
use crate::output::RankedRun;
use crate::pipeline::HotnessEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<HotnessEngine>,
    /// Default cap on returned items; `?limit=` overrides it.
    pub limit: Option<usize>,
}

impl AppState {
    pub fn new(engine: HotnessEngine) -> Self {
        let limit = engine.config().output.limit;
        Self {
            engine: Arc::new(engine),
            limit,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Touch the recorder before the first request so counters are captured.
    let _ = prometheus_handle();

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/rank", post(rank))
        .route("/metrics", get(metrics_text))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct RankParams {
    #[serde(default)]
    limit: Option<usize>,
}

async fn rank(
    State(state): State<AppState>,
    Query(params): Query<RankParams>,
    Json(items): Json<Vec<RawItem>>,
) -> Result<Json<RankedRun>, ApiError> {
    let now = Utc::now();
    let run = state.engine.run(items, now).await?;
    Ok(Json(run.truncated(params.limit.or(state.limit))))
}

async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        prometheus_handle().render(),
    )
}

/// Run failure mapped onto an HTTP status with a JSON `{"error": ...}` body.
pub struct ApiError(HotnessError);

impl From<HotnessError> for ApiError {
    fn from(e: HotnessError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            HotnessError::Configuration(_) => StatusCode::BAD_REQUEST,
            HotnessError::EmbeddingProvider(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(target: "api", error = %self.0, "rank request failed");
        } else {
            warn!(target: "api", error = %self.0, "rank request rejected");
        }
        let body = serde_json::json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}
