//! Classroom Endpoints
//! Mission: Classroom creation, self-enrollment, and roster assignment

use crate::api::AppState;
use crate::auth::models::User;
use crate::auth::policy;
use crate::error::AppError;
use crate::models::{Classroom, ClassroomCreate};
use crate::store::{classrooms, users};
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

/// Create classroom - POST /classrooms/classrooms (instructor only)
pub async fn create_classroom(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Json(payload): Json<ClassroomCreate>,
) -> Result<Json<Classroom>, AppError> {
    let classroom = state.store.unit_of_work(|tx| {
        policy::authorize(&policy::CREATE_CLASSROOM, tx, &caller, None)?;
        Ok(classrooms::create(tx, &payload.name, &caller.id)?)
    })?;

    info!(
        "Classroom '{}' created by {}",
        classroom.name, caller.username
    );

    Ok(Json(classroom))
}

/// Self-enroll - POST /classrooms/{id}/join (student only)
pub async fn join_classroom(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path(classroom_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::JOIN_CLASSROOM, &caller)?;

        let classroom = classrooms::find(tx, &classroom_id)?
            .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))?;

        classrooms::enroll(tx, &classroom.id, &caller.id)?;
        Ok(())
    })?;

    info!("{} joined classroom {}", caller.username, classroom_id);

    Ok(Json(json!({ "message": "Joined classroom" })))
}

/// Roster assignment - POST /classrooms/{id}/assign-student/{student_id}
///
/// Instructors may only assign students to classrooms they own.
pub async fn assign_student(
    State(state): State<AppState>,
    Extension(caller): Extension<User>,
    Path((classroom_id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let (classroom_name, student_name) = state.store.unit_of_work(|tx| {
        policy::require_roles(&policy::ASSIGN_STUDENT, &caller)?;

        let classroom = classrooms::find(tx, &classroom_id)?;
        let student = users::find_by_id(tx, &student_id)?;
        let (classroom, student) = match (classroom, student) {
            (Some(classroom), Some(student)) => (classroom, student),
            _ => {
                return Err(AppError::NotFound(
                    "Classroom or student not found".to_string(),
                ))
            }
        };

        policy::authorize(&policy::ASSIGN_STUDENT, tx, &caller, Some(&classroom))?;

        classrooms::enroll(tx, &classroom.id, &student.id)?;
        Ok((classroom.name, student.username))
    })?;

    info!(
        "Student {} assigned to classroom {} by {}",
        student_name, classroom_name, caller.username
    );

    Ok(Json(json!({
        "message": format!(
            "Student {} assigned to classroom {}",
            student_name, classroom_name
        )
    })))
}
