//! Authentication extractors.
//!
//! `RequireUser` loads the logged-in user from the session; `RequireAdmin`
//! additionally checks the admin flag. Both re-read the user row from the
//! store on every request, so a demotion takes effect immediately - there is
//! deliberately no process-level cache of privileged ids.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_sessions::Session;

use verdant_core::UserId;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::{User, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireUser(pub User);

/// Extractor that requires a logged-in admin.
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)
            .await?
            .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))?;

        Ok(Self(user))
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state)
            .await?
            .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))?;

        if !user.is_admin {
            return Err(AppError::Forbidden("admin access required".to_owned()));
        }

        Ok(Self(user))
    }
}

/// Resolve the current user from the session, re-reading the store.
async fn current_user<S>(parts: &mut Parts, state: &S) -> Result<Option<User>, AppError>
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };

    let user_id: Option<UserId> = session
        .get(session_keys::USER_ID)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    let state = AppState::from_ref(state);
    let user = UserRepository::new(state.pool()).get_by_id(user_id).await?;

    Ok(user)
}

/// Store the user id in the session after a successful login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_user(
    session: &Session,
    user_id: UserId,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::USER_ID, user_id).await
}

/// Clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.remove::<UserId>(session_keys::USER_ID).await?;
    Ok(())
}
