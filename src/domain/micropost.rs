use serde::Deserialize;

use super::{FieldError, run_validators};

pub const CONTENT_MAX_LEN: usize = 140;

/// Create request for a micropost. The owning user comes from the
/// authenticated request context, never from the body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewMicropost {
    pub content: String,
}

type MicropostValidator = fn(&NewMicropost) -> Option<FieldError>;

const VALIDATORS: &[MicropostValidator] = &[content_present, content_length];

impl NewMicropost {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        run_validators(self, VALIDATORS)
    }
}

fn content_present(m: &NewMicropost) -> Option<FieldError> {
    m.content
        .trim()
        .is_empty()
        .then(|| FieldError::new("content", "can't be blank"))
}

fn content_length(m: &NewMicropost) -> Option<FieldError> {
    (m.content.chars().count() > CONTENT_MAX_LEN).then(|| {
        FieldError::new(
            "content",
            format!("is too long (maximum is {CONTENT_MAX_LEN} characters)"),
        )
    })
}
