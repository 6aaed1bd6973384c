use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth;
use super::{
    ApiError, ApiResponse, AppState, NewSessionResponse, RedirectResponse, SessionStatus,
    SignInRequest, SignInResponse, UserDto,
};

/// GET /api/sessions/new
/// Signed-in guard for the sign-in form: an already-authenticated client is
/// told to go home instead.
pub async fn new(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<NewSessionResponse>>, ApiError> {
    let signed_in = auth::resolve_current_user(&state, &session, &headers)
        .await?
        .is_some();

    Ok(Json(ApiResponse::success(NewSessionResponse {
        redirect_to: signed_in.then(|| "/".to_string()),
    })))
}

/// POST /api/sessions
/// Sign in with email and password. The failure message never says whether
/// the email existed or the password was wrong.
pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<ApiResponse<SignInResponse>>, ApiError> {
    let user = state
        .store()
        .authenticate_user(&payload.email, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized(
            "Invalid email/password combination".to_string(),
        ));
    };

    let remember_token = state
        .store()
        .regenerate_remember_token(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate remember token: {e}")))?;

    auth::sign_in(&session, &user).await?;

    let redirect_to = auth::take_return_to(&session)
        .await
        .unwrap_or_else(|| format!("/users/{}", user.id));

    tracing::info!("User {} signed in", user.id);

    Ok(Json(ApiResponse::success(SignInResponse {
        user: user.into(),
        remember_token,
        redirect_to,
    })))
}

/// DELETE /api/sessions
/// Sign out and go home.
pub async fn destroy(
    session: Session,
) -> Result<Json<ApiResponse<RedirectResponse>>, ApiError> {
    auth::sign_out(&session).await?;

    Ok(Json(ApiResponse::success(RedirectResponse {
        redirect_to: "/".to_string(),
        flash: None,
    })))
}

/// GET /api/sessions
/// Current session status.
pub async fn show(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    let user = auth::resolve_current_user(&state, &session, &headers).await?;

    Ok(Json(ApiResponse::success(SessionStatus {
        signed_in: user.is_some(),
        user: user.map(UserDto::from),
    })))
}
