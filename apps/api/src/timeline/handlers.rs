use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::errors::AppError;
use crate::models::timeline::TimelineParams;
use crate::state::AppState;

/// GET /api/timeline
/// Responses are never cached: the feed changes as ingestion runs.
/// Undecodable query strings get the same JSON error body as failed validation.
pub async fn handle_get_timeline(
    State(state): State<AppState>,
    params: Result<Query<TimelineParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let params = params.without_blank_values();
    let response = state.timeline.get_timeline_posts(&params).await?;

    Ok((
        [
            (header::CACHE_CONTROL, "no-cache, no-store, must-revalidate"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "0"),
        ],
        Json(response),
    ))
}
