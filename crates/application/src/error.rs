use thiserror::Error;

use library_core::DomainError;

use crate::ports::PersistenceError;
use crate::validation::ValidationFailure;

/// Failure of a request, as seen by the caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input was rejected before any handler ran.
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// A value object or entity rule was broken.
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} with ID {id} could not be found.")]
    NotFound { entity: &'static str, id: i64 },

    /// A uniqueness rule was broken (email, ISBN within an author).
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Persistence(PersistenceError),

    #[error("request cancelled")]
    Cancelled,
}

impl AppError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

impl From<PersistenceError> for AppError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::Cancelled => AppError::Cancelled,
            PersistenceError::UniqueViolation { detail, .. } => AppError::Conflict(detail),
            other => AppError::Persistence(other),
        }
    }
}
