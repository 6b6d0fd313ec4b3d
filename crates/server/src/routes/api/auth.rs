//! Authentication API routes.
//!
//! JSON endpoints for registration, login, logout, and the current session.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::middleware::auth::{clear_session_user, set_session_user};
use crate::routes::api::users::UserResponse;
use crate::services::AuthService;
use crate::state::AppState;

/// Request to register a new account.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Register a new account and log it in.
///
/// POST /api/auth/register
///
/// # Errors
///
/// Returns 400 for invalid email/password, 409 for a duplicate email.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserResponse>> {
    if req.name.trim().is_empty() {
        return Err(AppError::validation([("name", "name is required")]));
    }

    let auth = AuthService::new(state.pool());
    let user = auth.register(&req.email, &req.password, req.name.trim()).await?;

    set_session_user(&session, user.id)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(UserResponse::from(user)))
}

/// Request to log in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login with email and password.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for a wrong email/password combination.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&req.email, &req.password).await?;

    set_session_user(&session, user.id)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(UserResponse::from(user)))
}

/// Logout the current session.
///
/// POST /api/auth/logout
///
/// # Errors
///
/// Returns 500 if the session cannot be cleared.
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_session_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Json(serde_json::json!({ "message": "logged out" })))
}

/// Get the currently logged-in user.
///
/// GET /api/auth/me
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn me(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Request to change the current user's password.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change the current user's password.
///
/// POST /api/auth/change-password
///
/// # Errors
///
/// Returns 401 if the current password is wrong, 400 if the new one is weak.
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    let auth = AuthService::new(state.pool());
    auth.change_password(&user, &req.current_password, &req.new_password)
        .await?;

    Ok(Json(serde_json::json!({ "message": "password changed" })))
}
