use axum::{
    extract::rejection::QueryRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Caller supplied malformed or out-of-range input. Raised before any store
/// access; `field` names the offending parameter as it appears on the wire.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError {
            field,
            message: message.into(),
        }
    }
}

/// The backing store rejected or failed a fetch. Never retried, never
/// downgraded to an empty result.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,
    #[source]
    pub source: anyhow::Error,
}

impl QueryError {
    pub fn new(message: impl Into<String>, source: anyhow::Error) -> Self {
        QueryError {
            message: message.into(),
            source,
        }
    }
}

/// Wraps a store-level `anyhow` failure into a `QueryError` with a stable message.
pub trait QueryContext<T> {
    fn query_context(self, message: &str) -> Result<T, QueryError>;
}

impl<T> QueryContext<T> for anyhow::Result<T> {
    fn query_context(self, message: &str) -> Result<T, QueryError> {
        self.map_err(|source| QueryError::new(message, source))
    }
}

/// Everything `TimelineService::get_timeline_posts` can fail with.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(ValidationError),

    #[error("Database error: {0}")]
    Query(QueryError),
}

impl From<TimelineError> for AppError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::Validation(e) => AppError::Validation(e),
            TimelineError::Query(e) => AppError::Query(e),
        }
    }
}

/// A query string the extractor could not decode (duplicate keys, bad
/// percent-encoding) is a caller error like any other.
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationError::new("query", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match &self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.message.clone(),
                None,
            ),
            AppError::Query(e) => {
                tracing::error!("Database error: {e}: {:?}", e.source);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Database query failed".to_string(),
                    Some(e.message.clone()),
                )
            }
        };

        let mut body = json!({
            "status": "error",
            "code": code,
            "message": message,
        });
        if let Some(detail) = detail {
            body["error"] = json!(detail);
        }

        (
            status,
            [(header::CACHE_CONTROL, "no-cache, no-store, must-revalidate")],
            Json(body),
        )
            .into_response()
    }
}
