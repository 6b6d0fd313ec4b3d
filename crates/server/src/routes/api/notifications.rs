//! Notification API routes.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use verdant_core::{NotificationId, OrderId};

use crate::db::notifications::NotificationRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::Notification;
use crate::state::AppState;

/// Client-facing notification shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: NotificationId,
    pub order_id: Option<OrderId>,
    pub kind: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            order_id: n.order_id,
            kind: n.kind,
            body: n.body,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// List the caller's notifications, newest first.
///
/// GET /api/notifications
///
/// # Errors
///
/// Returns 401 when not logged in.
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<NotificationResponse>>> {
    let notifications = NotificationRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(
        notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
    ))
}

/// Mark one of the caller's notifications as read.
///
/// PUT /api/notifications/{id}/read
///
/// # Errors
///
/// Returns 404 if the notification doesn't exist or belongs to someone else.
pub async fn mark_read(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    NotificationRepository::new(state.pool())
        .mark_read(NotificationId::new(id), user.id)
        .await?;

    Ok(Json(serde_json::json!({ "message": "marked read" })))
}
