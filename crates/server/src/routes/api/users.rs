//! User management API routes.
//!
//! Profile editing for account holders, full CRUD plus balance top-ups for
//! admins.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use verdant_core::UserId;

use crate::db::notifications::NotificationRepository;
use crate::db::users::{UpdateProfile, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::User;
use crate::state::AppState;

/// Client-facing user shape. Never includes the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_admin: bool,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.into_inner(),
            name: user.name,
            phone: user.phone,
            address: user.address,
            is_admin: user.is_admin,
            balance: user.balance,
            created_at: user.created_at,
        }
    }
}

/// List all users.
///
/// GET /api/users (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get one user.
///
/// GET /api/users/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the user doesn't exist.
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    Ok(Json(UserResponse::from(user)))
}

/// Request to update profile fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Admin-only: grant or revoke back-office access.
    pub is_admin: Option<bool>,
}

/// Update a user.
///
/// PUT /api/users/{id}
///
/// Account holders may edit their own profile fields; admins may edit anyone
/// and toggle the admin flag.
///
/// # Errors
///
/// Returns 403 when editing someone else without admin rights.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(caller): RequireUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let target = UserId::new(id);
    let editing_self = caller.id == target;

    if !editing_self && !caller.is_admin {
        return Err(AppError::Forbidden("cannot edit another user".to_owned()));
    }
    if req.is_admin.is_some() && !caller.is_admin {
        return Err(AppError::Forbidden(
            "only admins can change the admin flag".to_owned(),
        ));
    }

    let repo = UserRepository::new(state.pool());
    let user = repo
        .update_profile(
            target,
            &UpdateProfile {
                name: req.name,
                phone: req.phone,
                address: req.address,
            },
        )
        .await?;

    if let Some(is_admin) = req.is_admin
        && is_admin != user.is_admin
    {
        repo.set_admin(target, is_admin).await?;
    }

    let user = repo
        .get_by_id(target)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user.
///
/// DELETE /api/users/{id} (admin)
///
/// # Errors
///
/// Returns 404 if the user doesn't exist.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let target = UserId::new(id);
    if admin.id == target {
        return Err(AppError::BadRequest("cannot delete your own account".to_owned()));
    }

    let deleted = UserRepository::new(state.pool()).delete(target).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("user {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Request to top up a balance.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpRequest {
    pub amount: Decimal,
}

/// Add to a user's prepaid balance.
///
/// POST /api/users/{id}/balance (admin)
///
/// # Errors
///
/// Returns 400 for non-positive amounts, 404 for unknown users.
pub async fn top_up_balance(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i64>,
    Json(req): Json<TopUpRequest>,
) -> Result<Json<UserResponse>> {
    if req.amount <= Decimal::ZERO {
        return Err(AppError::validation([("amount", "must be positive")]));
    }

    let target = UserId::new(id);
    let user = UserRepository::new(state.pool())
        .add_balance(target, req.amount)
        .await?;

    NotificationRepository::new(state.pool())
        .create(
            target,
            None,
            "balance",
            &format!("Your balance was topped up by {}", req.amount),
        )
        .await?;

    Ok(Json(UserResponse::from(user)))
}
