use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::db::SaveError;
use crate::domain::NewMicropost;

use super::auth::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, FeedResponse, FlashDto, MicropostCreated, MicropostDto,
    RedirectResponse,
};

/// POST /api/microposts
/// Create a post owned by the current user.
///
/// On validation failure the home view is re-rendered with an EMPTY feed
/// placeholder instead of the real feed. That mismatch is long-standing
/// behavior and is kept as is.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(payload): Json<NewMicropost>,
) -> Result<Response, ApiError> {
    match state.store().create_micropost(current.id, &payload).await {
        Ok(post) => {
            tracing::info!("User {} created micropost {}", current.id, post.id);

            Ok(Json(ApiResponse::success(MicropostCreated {
                micropost: post.into(),
                flash: FlashDto::success("Micropost created!"),
                redirect_to: "/".to_string(),
            }))
            .into_response())
        }
        Err(SaveError::Invalid(errors)) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::rejected(
                FeedResponse { feed: Vec::new() },
                errors,
            )),
        )
            .into_response()),
        Err(SaveError::Database(e)) => Err(ApiError::DatabaseError(e.to_string())),
    }
}

/// DELETE /api/microposts/{id}
/// The lookup is scoped to the current user's own posts, so a post owned by
/// someone else is never found and never destroyed. Either way the response
/// is a bare redirect home; lookup failures stay invisible.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RedirectResponse>>, ApiError> {
    let owned = state
        .store()
        .find_micropost_owned(id, current.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to look up micropost: {e}")))?;

    match owned {
        Some(post) => {
            state
                .store()
                .delete_micropost(post.id)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to delete micropost: {e}")))?;

            tracing::info!("User {} deleted micropost {}", current.id, post.id);
        }
        None => {
            tracing::debug!(
                "User {} tried to delete micropost {} they do not own",
                current.id,
                id
            );
        }
    }

    Ok(Json(ApiResponse::success(RedirectResponse {
        redirect_to: "/".to_string(),
        flash: None,
    })))
}

/// GET /api/feed
/// The current user's feed, newest first.
pub async fn feed(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<FeedResponse>>, ApiError> {
    let posts = state
        .store()
        .feed(current.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load feed: {e}")))?;

    Ok(Json(ApiResponse::success(FeedResponse {
        feed: posts.into_iter().map(MicropostDto::from).collect(),
    })))
}
