//! Tutoring Endpoint
//! Mission: Forward a topic to the tutoring model for students and instructors

use crate::api::AppState;
use crate::auth::models::{User, ROLE_STUDENT};
use crate::auth::policy;
use crate::error::AppError;
use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub topic: String,
}

/// Ask the tutor - POST /ai/ask (student or instructor)
pub async fn ask_tutor(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<Value>, AppError> {
    policy::require_roles(&policy::ASK_TUTOR, &caller)?;

    let tutor = state
        .tutor
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Tutor model not configured")))?;

    let caller_role = caller
        .roles
        .first()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| ROLE_STUDENT.to_string());

    info!("Tutor question from {}: {}", caller.username, payload.topic);

    let result = tutor.ask(&payload.topic, &caller_role).await?;

    Ok(Json(json!({ "result": result })))
}
