//! Role Endpoints
//! Mission: Role administration and the one-time admin bootstrap

use crate::api::AppState;
use crate::auth::models::{Role, UserResponse, ROLE_ADMIN};
use crate::auth::policy;
use crate::error::AppError;
use crate::store::{roles, users};
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RoleCreate {
    pub name: String,
    pub description: Option<String>,
}

/// One-time setup - POST /roles/bootstrap-admin
///
/// Open by design: guarded by the existence check, not by a credential.
/// Creates the admin role and the first admin user; a second call fails
/// without touching anything.
pub async fn bootstrap_admin(
    State(state): State<AppState>,
) -> Result<Json<Role>, AppError> {
    let role = state.store.unit_of_work(|tx| {
        if roles::find_by_name(tx, ROLE_ADMIN)?.is_some() {
            return Err(AppError::Conflict("Admin role already exists".to_string()));
        }

        let role = roles::create(tx, ROLE_ADMIN, Some("Administrator role"))?;

        if users::find_by_username(tx, "admin")?.is_none() {
            let admin = users::create(
                tx,
                "admin",
                "admin@example.com",
                &state.config.bootstrap_admin_password,
            )?;
            roles::assign_to_user(tx, &admin.id, &role.id)?;
        }

        Ok(role)
    })?;

    warn!("Bootstrap admin performed; change the default password if unset");

    Ok(Json(role))
}

/// Create role - POST /roles/ (admin only)
pub async fn create_role(
    State(state): State<AppState>,
    Extension(caller): Extension<crate::auth::models::User>,
    Json(payload): Json<RoleCreate>,
) -> Result<Json<Role>, AppError> {
    let role = state.store.unit_of_work(|tx| {
        policy::authorize(&policy::CREATE_ROLE, tx, &caller, None)?;

        if roles::find_by_name(tx, &payload.name)?.is_some() {
            return Err(AppError::Conflict("Role already exists".to_string()));
        }

        Ok(roles::create(tx, &payload.name, payload.description.as_deref())?)
    })?;

    info!("Created role: {}", role.name);

    Ok(Json(role))
}

/// List roles - GET /roles/ (any authenticated caller)
pub async fn list_roles(
    State(state): State<AppState>,
) -> Result<Json<Vec<Role>>, AppError> {
    let roles = state.store.unit_of_work(|tx| Ok(roles::list(tx)?))?;
    Ok(Json(roles))
}

/// Assign role - POST /roles/assign/{user_id}/{role_id} (admin only)
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(caller): Extension<crate::auth::models::User>,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let (user, role) = state.store.unit_of_work(|tx| {
        policy::authorize(&policy::ASSIGN_ROLE, tx, &caller, None)?;

        let user = users::find_by_id(tx, &user_id)?;
        let role = roles::find_by_id(tx, &role_id)?;
        let (user, role) = match (user, role) {
            (Some(user), Some(role)) => (user, role),
            _ => return Err(AppError::NotFound("User or role not found".to_string())),
        };

        roles::assign_to_user(tx, &user.id, &role.id)?;
        Ok((UserResponse::from_user(&user), role))
    })?;

    info!("Assigned role {} to {}", role.name, user.username);

    Ok(Json(json!({
        "message": format!("Role '{}' assigned to user '{}'", role.name, user.username)
    })))
}
