//! Lesson Endpoints
//! Mission: Lesson creation and role-scoped lesson reads

use crate::api::AppState;
use crate::auth::models::User;
use crate::auth::policy::{self, ListScope};
use crate::error::AppError;
use crate::models::{Lesson, LessonCreate};
use crate::store::{classrooms, lessons};
use anyhow::Context;
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use tracing::info;
use uuid::Uuid;

/// Create lesson - POST /lessons/ (instructor owning the classroom)
pub async fn create_lesson(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Json(payload): Json<LessonCreate>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::CREATE_LESSON, &caller)?;

        let classroom = classrooms::find(tx, &payload.classroom_id)?
            .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))?;

        policy::authorize(&policy::CREATE_LESSON, tx, &caller, Some(&classroom))?;

        Ok(lessons::create(
            tx,
            &payload.title,
            payload.content.as_deref(),
            &classroom.id,
        )?)
    })?;

    info!("Lesson '{}' created by {}", lesson.title, caller.username);

    Ok(Json(lesson))
}

/// Read lesson - GET /lessons/{id}
///
/// Resolved by the caller's first matching role in the configured
/// precedence order (admin, then instructor, then student by default).
pub async fn read_lesson(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Lesson>, AppError> {
    let lesson = state.store.unit_of_work(|tx| {
        let lesson = lessons::find(tx, &lesson_id)?
            .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;

        let classroom = classrooms::find(tx, &lesson.classroom_id)?
            .context("Lesson references a missing classroom")?;

        policy::lesson_read_access(&state.config.role_precedence, tx, &caller, &classroom)?;

        Ok(lesson)
    })?;

    Ok(Json(lesson))
}

/// List lessons - GET /lessons/
///
/// The caller's role decides the scope ahead of the query: instructors
/// get lessons of classrooms they own, everyone else lessons of
/// classrooms they are enrolled in. No matches means an empty list.
pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
) -> Result<Json<Vec<Lesson>>, AppError> {
    let lessons = state.store.unit_of_work(|tx| {
        let lessons = match policy::list_scope(&caller) {
            ListScope::OwnedClassrooms => lessons::list_owned_by(tx, &caller.id)?,
            ListScope::EnrolledClassrooms => lessons::list_enrolled(tx, &caller.id)?,
        };
        Ok(lessons)
    })?;

    Ok(Json(lessons))
}
