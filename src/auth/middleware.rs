//! Authentication Middleware
//! Mission: Resolve "who is calling" before any handler body runs

use crate::api::AppState;
use crate::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

/// Verify the bearer token, load the user with roles eagerly, and stash
/// the identity in request extensions. Runs on every protected route, so
/// no resource access happens for an unauthenticated caller.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AppError::Unauthorized("Missing authorization token"))?;

    let claims = state.jwt.verify(&token).map_err(|_| {
        warn!("Rejected bearer token");
        AppError::Unauthorized("Invalid or expired token")
    })?;

    let user = state
        .store
        .unit_of_work(|tx| Ok(crate::store::users::find_by_username(tx, &claims.sub)?))?
        .ok_or(AppError::Unauthorized("Could not validate credentials"))?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
