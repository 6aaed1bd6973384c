use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::Value;
use std::sync::Arc;
use tower_sessions::Session;

use crate::domain::{FieldError, NewUser};

use super::auth::{self, CurrentUser};
use super::{
    ApiError, ApiResponse, AppState, FlashDto, MicropostDto, ProfileResponse, RedirectResponse,
    SignupResponse,
};

/// Attributes that must never bind from a signup body. Sending one is a
/// security violation, not a validation problem.
const PROTECTED_FIELDS: &[&str] = &["admin", "password_digest", "remember_token"];

fn reject_protected_fields(body: &Value) -> Result<(), ApiError> {
    if let Some(map) = body.as_object() {
        for field in PROTECTED_FIELDS {
            if map.contains_key(*field) {
                return Err(ApiError::Forbidden(format!(
                    "{field} cannot be set through signup"
                )));
            }
        }
    }
    Ok(())
}

/// POST /api/users
/// Sign up. The new account is signed in immediately.
pub async fn create(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<SignupResponse>>, ApiError> {
    reject_protected_fields(&body)?;

    let new_user: NewUser = serde_json::from_value(body)
        .map_err(|e| ApiError::Validation(vec![FieldError::new("base", e.to_string())]))?;

    let user = state
        .store()
        .create_user(&new_user, state.security())
        .await?;

    auth::sign_in(&session, &user).await?;

    tracing::info!("User {} signed up", user.id);

    let redirect_to = format!("/users/{}", user.id);
    let remember_token = user.remember_token.clone();

    Ok(Json(ApiResponse::success(SignupResponse {
        user: user.into(),
        remember_token,
        flash: FlashDto::success("Welcome to Murmur!"),
        redirect_to,
    })))
}

/// GET /api/users/{id}
/// Public profile: the user and their microposts, newest first.
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state
        .store()
        .find_user(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    let microposts = state
        .store()
        .microposts_for_user(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load microposts: {e}")))?;

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: user.into(),
        microposts: microposts.into_iter().map(MicropostDto::from).collect(),
    })))
}

/// DELETE /api/users/{id}
/// Allowed for the account owner and for admins. The user and all their
/// microposts go in one transaction; a failed cascade aborts the deletion.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RedirectResponse>>, ApiError> {
    if current.id != id && !current.admin {
        return Err(ApiError::Forbidden(
            "You are not allowed to delete this user".to_string(),
        ));
    }

    let deleted = state
        .store()
        .delete_user_with_microposts(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?;

    if !deleted {
        return Err(ApiError::not_found("User", id));
    }

    if current.id == id {
        auth::sign_out(&session).await?;
    }

    tracing::info!("User {id} deleted by user {}", current.id);

    Ok(Json(ApiResponse::success(RedirectResponse {
        redirect_to: "/".to_string(),
        flash: Some(FlashDto::success("User deleted")),
    })))
}
