//! Request Error Taxonomy
//! Mission: One error type for every handler, mapped onto HTTP once

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

/// Terminal request errors. Every failed check produces exactly one of
/// these before any write happens.
#[derive(Debug)]
pub enum AppError {
    /// Missing/invalid/expired credentials (401)
    Unauthorized(&'static str),
    /// Role or ownership mismatch (403)
    Forbidden(&'static str),
    /// Primary resource id did not resolve (404)
    NotFound(String),
    /// Duplicate unique field or pre-existing singleton (400)
    Conflict(String),
    /// Malformed input such as an unparseable id (400)
    BadRequest(String),
    /// Anything below the HTTP boundary that should not leak detail (500)
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::Internal(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
