//! Admin CSV export routes.
//!
//! All exports are semicolon-delimited, UTF-8 BOM-prefixed attachments.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::export::{ExportError, ExportService};
use crate::state::AppState;

impl From<ExportError> for AppError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Repository(err) => Self::Database(err),
            other => Self::Internal(other.to_string()),
        }
    }
}

fn csv_response(file_name: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Download all users as CSV.
///
/// GET /api/export/users (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response> {
    let bytes = ExportService::new(state.pool()).users_csv().await?;
    Ok(csv_response("users.csv", bytes))
}

/// Download the catalog as CSV.
///
/// GET /api/export/products (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response> {
    let bytes = ExportService::new(state.pool()).products_csv().await?;
    Ok(csv_response("products.csv", bytes))
}

/// Download all orders as CSV.
///
/// GET /api/export/orders (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response> {
    let bytes = ExportService::new(state.pool()).orders_csv().await?;
    Ok(csv_response("orders.csv", bytes))
}

/// Download shop statistics as CSV.
///
/// GET /api/export/statistics (admin)
///
/// # Errors
///
/// Returns 403 for non-admins.
pub async fn statistics(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Response> {
    let bytes = ExportService::new(state.pool()).statistics_csv().await?;
    Ok(csv_response("statistics.csv", bytes))
}
