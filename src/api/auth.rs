use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tower_sessions::Session;

use crate::db::User;

use super::{ApiError, AppState};

pub const SESSION_USER_KEY: &str = "user_id";
pub const RETURN_TO_KEY: &str = "return_to";
pub const REMEMBER_TOKEN_HEADER: &str = "X-Remember-Token";

/// The authenticated user for this request, inserted by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Authentication middleware. Resolution order:
/// 1. Session cookie (from sign-in)
/// 2. `X-Remember-Token` header (persistent identification)
///
/// Unauthenticated requests get a 401, and the requested path is recorded
/// in the session so the next sign-in can forward back to it.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(user) = resolve_current_user(&state, &session, request.headers()).await? {
        tracing::Span::current().record("user_id", user.id);
        request.extensions_mut().insert(CurrentUser(user));
        return Ok(next.run(request).await);
    }

    let path = request.uri().path().to_string();
    if let Err(e) = session.insert(RETURN_TO_KEY, path).await {
        tracing::warn!("Failed to record return path: {e}");
    }

    Ok((StatusCode::UNAUTHORIZED, "Please sign in").into_response())
}

/// Resolve the current user from session state or the remember-token header.
pub async fn resolve_current_user(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
) -> Result<Option<User>, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        let user = state
            .store()
            .find_user(user_id)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to load session user: {e}")))?;

        if user.is_some() {
            return Ok(user);
        }

        // Stale session pointing at a deleted account
        let _ = session.flush().await;
    }

    if let Some(token) = headers
        .get(REMEMBER_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let user = state
            .store()
            .find_user_by_remember_token(token.trim())
            .await
            .map_err(|e| ApiError::internal(format!("Failed to verify remember token: {e}")))?;

        return Ok(user);
    }

    Ok(None)
}

/// Bind the user to the session.
pub async fn sign_in(session: &Session, user: &User) -> Result<(), ApiError> {
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// Clear all session state for this client.
pub async fn sign_out(session: &Session) -> Result<(), ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear session: {e}")))
}

/// Take the stored friendly-forwarding path, if any.
pub async fn take_return_to(session: &Session) -> Option<String> {
    session.remove::<String>(RETURN_TO_KEY).await.ok().flatten()
}
