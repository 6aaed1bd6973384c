//! Typed create-requests and validators for the persisted entities.
//!
//! Each entity declares an ordered list of validator functions. Every
//! validator runs even after an earlier one fails, so one response can
//! surface all field errors at once.

mod micropost;
mod user;

pub use micropost::{CONTENT_MAX_LEN, NewMicropost};
pub use user::{NAME_MAX_LEN, NewUser, PASSWORD_MIN_LEN};

use serde::Serialize;

/// A single field-scoped validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn run_validators<T>(
    value: &T,
    validators: &[fn(&T) -> Option<FieldError>],
) -> Result<(), Vec<FieldError>> {
    let failures: Vec<FieldError> = validators.iter().filter_map(|v| v(value)).collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(failures)
    }
}
