use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use firefly_core::{write_json, Config};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::metrics::encode_metrics;
use crate::state::AppState;

/// Header carrying the id of the run that produced a top-words response.
pub const RUN_ID_HEADER: &str = "x-firefly-run-id";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct TopWordsParams {
    /// Number of tokens to report; the configured `run.top_n` when absent.
    pub n: Option<i64>,
}

pub async fn root() -> &'static str {
    "firefly is running\n"
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<Config> {
    Json(state.config().clone())
}

/// GET /api/v1/top-words?n=N
///
/// Run the pipeline over the configured sources and return the `n` most
/// frequent vocabulary tokens as a pretty-printed `{ token: count }` object.
pub async fn top_words(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopWordsParams>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let n = params.n.unwrap_or(state.config().run.top_n);
    if n <= 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "n must be greater than 0".to_string(),
            }),
        ));
    }

    // Shutdown cancels runs that are still in progress.
    let cancel = state.shutdown().child_token();
    let report = state.app().run_with_top_n(n, &cancel).await.map_err(|e| {
        error!(error = %e, "Top-words run failed");
        internal_error(e.to_string())
    })?;

    let mut body = Vec::new();
    write_json(&report, &mut body).map_err(|e| internal_error(e.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::HeaderName::from_static(RUN_ID_HEADER),
                report.summary.run_id.to_string(),
            ),
        ],
        body,
    )
        .into_response())
}

fn internal_error(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error }),
    )
}
