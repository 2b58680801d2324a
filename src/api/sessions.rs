//! Session Endpoints
//! Mission: Session lifecycle, gated per operation by the policy table

use crate::api::AppState;
use crate::auth::models::User;
use crate::auth::policy::{self, ListScope};
use crate::error::AppError;
use crate::models::{Classroom, Session, SessionCreate, SessionUpdate};
use crate::store::{classrooms, lessons, sessions};
use anyhow::Context;
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::Utc;
use rusqlite::Transaction;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Resolve a lesson's classroom or report the lesson missing. Shared by
/// every session operation whose ownership rule targets the classroom.
fn lesson_classroom(
    tx: &Transaction,
    lesson_id: &Uuid,
) -> Result<(crate::models::Lesson, Classroom), AppError> {
    let lesson = lessons::find(tx, lesson_id)?
        .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;

    let classroom = classrooms::find(tx, &lesson.classroom_id)?
        .context("Lesson references a missing classroom")?;

    Ok((lesson, classroom))
}

/// Create session - POST /sessions/ (instructor owning the classroom)
pub async fn create_session(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Json(payload): Json<SessionCreate>,
) -> Result<Json<Session>, AppError> {
    let session = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::CREATE_SESSION, &caller)?;

        let (lesson, classroom) = lesson_classroom(tx, &payload.lesson_id)?;
        policy::authorize(&policy::CREATE_SESSION, tx, &caller, Some(&classroom))?;

        Ok(sessions::create(
            tx,
            &lesson.id,
            payload.start_time.unwrap_or_else(Utc::now),
            payload.is_active.unwrap_or(true),
        )?)
    })?;

    info!("Session {} created by {}", session.id, caller.username);

    Ok(Json(session))
}

/// Start session - POST /sessions/start/{lesson_id} (enrolled student)
///
/// Always stamped now/active; students cannot schedule.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Session>, AppError> {
    let session = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::START_SESSION, &caller)?;

        let (lesson, classroom) = lesson_classroom(tx, &lesson_id)?;
        policy::authorize(&policy::START_SESSION, tx, &caller, Some(&classroom))?;

        Ok(sessions::create(tx, &lesson.id, Utc::now(), true)?)
    })?;

    info!(
        "Session {} started by student {}",
        session.id, caller.username
    );

    Ok(Json(session))
}

/// List a lesson's sessions - GET /sessions/lesson/{lesson_id}
/// (instructor owning the classroom)
pub async fn list_lesson_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Vec<Session>>, AppError> {
    let sessions = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::LIST_LESSON_SESSIONS, &caller)?;

        let (lesson, classroom) = lesson_classroom(tx, &lesson_id)?;
        policy::authorize(&policy::LIST_LESSON_SESSIONS, tx, &caller, Some(&classroom))?;

        Ok(sessions::list_for_lesson(tx, &lesson.id)?)
    })?;

    Ok(Json(sessions))
}

/// List every session - GET /sessions/all (admin only)
pub async fn list_all_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
) -> Result<Json<Vec<Session>>, AppError> {
    let sessions = state.store.unit_of_work(|tx| {
        policy::authorize(&policy::LIST_ALL_SESSIONS, tx, &caller, None)?;
        Ok(sessions::list_all(tx)?)
    })?;

    Ok(Json(sessions))
}

/// List sessions in the caller's scope - GET /sessions/
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
) -> Result<Json<Vec<Session>>, AppError> {
    let sessions = state.store.unit_of_work(|tx| {
        let sessions = match policy::list_scope(&caller) {
            ListScope::OwnedClassrooms => sessions::list_owned_by(tx, &caller.id)?,
            ListScope::EnrolledClassrooms => sessions::list_enrolled(tx, &caller.id)?,
        };
        Ok(sessions)
    })?;

    Ok(Json(sessions))
}

/// Update session - PUT /sessions/{id} (instructor owning the classroom)
pub async fn update_session(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SessionUpdate>,
) -> Result<Json<Session>, AppError> {
    let session = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::UPDATE_SESSION, &caller)?;

        let session = sessions::find(tx, &session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let (_, classroom) = lesson_classroom(tx, &session.lesson_id)?;
        policy::authorize(&policy::UPDATE_SESSION, tx, &caller, Some(&classroom))?;

        Ok(sessions::update(
            tx,
            &session,
            payload.start_time,
            payload.is_active,
        )?)
    })?;

    info!("Session {} updated by {}", session.id, caller.username);

    Ok(Json(session))
}

/// Delete session - DELETE /sessions/{id} (instructor owning the classroom)
pub async fn delete_session(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::DELETE_SESSION, &caller)?;

        let session = sessions::find(tx, &session_id)?
            .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

        let (_, classroom) = lesson_classroom(tx, &session.lesson_id)?;
        policy::authorize(&policy::DELETE_SESSION, tx, &caller, Some(&classroom))?;

        sessions::delete(tx, &session.id)?;
        Ok(())
    })?;

    info!("Session {} deleted by {}", session_id, caller.username);

    Ok(Json(json!({
        "message": format!("Session {} deleted successfully", session_id)
    })))
}
