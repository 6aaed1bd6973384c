use serde::{Deserialize, Serialize};

use crate::db::{Micropost, User};
use crate::domain::FieldError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn validation_failure(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }

    /// Validation failure that still carries a payload, for handlers that
    /// re-render a view alongside the field errors.
    pub fn rejected(data: T, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some("Validation failed".to_string()),
            errors: Some(errors),
        }
    }
}

/// One-request-lifetime status message surfaced to the user.
#[derive(Debug, Clone, Serialize)]
pub struct FlashDto {
    pub level: &'static str,
    pub message: String,
}

impl FlashDto {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: "success",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub admin: bool,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            admin: user.admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MicropostDto {
    pub id: i32,
    pub content: String,
    pub user_id: i32,
    pub created_at: String,
}

impl From<Micropost> for MicropostDto {
    fn from(post: Micropost) -> Self {
        Self {
            id: post.id,
            content: post.content,
            user_id: post.user_id,
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user: UserDto,
    pub remember_token: String,
    pub flash: FlashDto,
    pub redirect_to: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub user: UserDto,
    pub remember_token: String,
    pub redirect_to: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub signed_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
}

/// Signed-in guard for the sign-in form: `redirect_to` is set when the
/// client is already authenticated and should go home instead.
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RedirectResponse {
    pub redirect_to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<FlashDto>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserDto,
    pub microposts: Vec<MicropostDto>,
}

#[derive(Debug, Serialize)]
pub struct MicropostCreated {
    pub micropost: MicropostDto,
    pub flash: FlashDto,
    pub redirect_to: String,
}

/// The home view payload. On a failed micropost creation the feed is
/// intentionally an empty placeholder, not a reload of the real feed.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub feed: Vec<MicropostDto>,
}
