//! HTTP API
//! Mission: Route table and shared application state

pub mod ai;
pub mod classrooms;
pub mod lessons;
pub mod roles;
pub mod sessions;
pub mod users;

use crate::auth::{auth_middleware, JwtIssuer};
use crate::config::Config;
use crate::store::Store;
use crate::tutor::TutorClient;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub jwt: Arc<JwtIssuer>,
    pub config: Arc<Config>,
    pub tutor: Option<TutorClient>,
}

/// Assemble the full router: a public surface (registration, login, the
/// one-time bootstrap, health) and a protected surface where the auth
/// middleware resolves the caller before any handler runs.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/users/", post(users::register).get(users::list_users))
        .route("/users/login", post(users::login))
        .route("/users/:user_id", delete(users::delete_user))
        .route("/roles/bootstrap-admin", post(roles::bootstrap_admin));

    let protected_routes = Router::new()
        .route("/roles/", post(roles::create_role).get(roles::list_roles))
        .route("/roles/assign/:user_id/:role_id", post(roles::assign_role))
        .route("/classrooms/classrooms", post(classrooms::create_classroom))
        .route("/classrooms/:classroom_id/join", post(classrooms::join_classroom))
        .route(
            "/classrooms/:classroom_id/assign-student/:student_id",
            post(classrooms::assign_student),
        )
        .route("/lessons/", post(lessons::create_lesson).get(lessons::list_lessons))
        .route("/lessons/:lesson_id", get(lessons::read_lesson))
        .route("/sessions/", post(sessions::create_session).get(sessions::list_sessions))
        .route("/sessions/start/:lesson_id", post(sessions::start_session))
        .route("/sessions/lesson/:lesson_id", get(sessions::list_lesson_sessions))
        .route("/sessions/all", get(sessions::list_all_sessions))
        .route(
            "/sessions/:session_id",
            put(sessions::update_session).delete(sessions::delete_session),
        )
        .route("/ai/ask", post(ai::ask_tutor))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn(crate::middleware::request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
