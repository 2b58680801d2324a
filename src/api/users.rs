//! User Endpoints
//! Mission: Registration, login, and the open user administration surface

use crate::api::AppState;
use crate::auth::models::{
    LoginForm, RegisterRequest, TokenResponse, UserResponse, ROLE_STUDENT,
};
use crate::error::AppError;
use crate::store::{roles, users};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    Form, Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

/// Register - POST /users/
///
/// Every account created here is granted exactly the student role.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.store.unit_of_work(|tx| {
        if users::find_by_username(tx, &payload.username)?.is_some() {
            return Err(AppError::Conflict("Username already registered".to_string()));
        }
        if users::email_taken(tx, &payload.email)? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        // Seeding runs at startup; a missing student role is a deployment
        // fault, not a client error.
        let student_role = roles::find_by_name(tx, ROLE_STUDENT)?
            .context("Student role not initialized")?;

        let user = users::create(tx, &payload.username, &payload.email, &payload.password)?;
        roles::assign_to_user(tx, &user.id, &student_role.id)?;

        Ok(users::find_by_id(tx, &user.id)?.context("Created user vanished")?)
    })?;

    info!("Registered user: {}", user.username);

    Ok(Json(UserResponse::from_user(&user)))
}

/// Login - POST /users/login (form-encoded)
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .store
        .unit_of_work(|tx| Ok(users::find_by_username(tx, &form.username)?));

    let user = match user? {
        Some(user) if bcrypt::verify(&form.password, &user.password_hash).unwrap_or(false) => user,
        _ => {
            warn!("Failed login attempt: {}", form.username);
            return Err(AppError::Unauthorized("Incorrect username or password"));
        }
    };

    let access_token = state.jwt.issue(&user.username)?;

    info!("Login successful: {}", user.username);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

/// List users - GET /users/
///
/// Open in the observed design; see the startup warning in main.
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state
        .store
        .unit_of_work(|tx| Ok(users::list(tx)?))?;

    Ok(Json(users.iter().map(UserResponse::from_user).collect()))
}

/// Delete user - DELETE /users/{id}
///
/// Open in the observed design; see the startup warning in main.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.store.unit_of_work(|tx| {
        if !users::delete(tx, &user_id)? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    })?;

    info!("Deleted user: {}", user_id);

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
