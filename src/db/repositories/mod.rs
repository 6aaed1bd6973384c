use thiserror::Error;

use crate::domain::FieldError;

pub mod micropost;
pub mod user;

/// Save-time failure: either aggregated field validation errors or an
/// underlying database problem.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("validation failed")]
    Invalid(Vec<FieldError>),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}
