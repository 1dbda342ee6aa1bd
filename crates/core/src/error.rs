//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Raised by value object factories and entity operations when a local shape
/// invariant would be broken. Referential checks (does the author exist, is
/// the email taken) are orchestration concerns and are not modelled here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required value was missing or blank.
    #[error("{field} cannot be empty.")]
    NullOrEmpty { field: &'static str },

    /// A value was present but malformed.
    #[error("{message}")]
    InvalidFormat { field: &'static str, message: String },

    /// A value was outside its permitted length or range.
    #[error("{message}")]
    OutOfRange { field: &'static str, message: String },

    /// A date lies after the current local date.
    #[error("{field} shouldn't exceed today's date.")]
    FutureDate { field: &'static str },

    /// A foreign reference was negative.
    #[error("invalid {field}: {value}")]
    NegativeReference { field: &'static str, value: i64 },

    /// An entity that already has an identity was given a different one.
    #[error("identity already assigned (current: {current}, attempted: {attempted})")]
    IdentityReassigned { current: i64, attempted: i64 },
}

/// Discriminant of [`DomainError`], convenient for matching without payloads.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DomainErrorKind {
    NullOrEmpty,
    InvalidFormat,
    OutOfRange,
    FutureDate,
    NegativeReference,
    IdentityReassigned,
}

impl DomainError {
    pub fn null_or_empty(field: &'static str) -> Self {
        Self::NullOrEmpty { field }
    }

    pub fn invalid_format(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            message: message.into(),
        }
    }

    pub fn out_of_range(field: &'static str, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            message: message.into(),
        }
    }

    pub fn future_date(field: &'static str) -> Self {
        Self::FutureDate { field }
    }

    pub fn negative_reference(field: &'static str, value: i64) -> Self {
        Self::NegativeReference { field, value }
    }

    pub fn kind(&self) -> DomainErrorKind {
        match self {
            DomainError::NullOrEmpty { .. } => DomainErrorKind::NullOrEmpty,
            DomainError::InvalidFormat { .. } => DomainErrorKind::InvalidFormat,
            DomainError::OutOfRange { .. } => DomainErrorKind::OutOfRange,
            DomainError::FutureDate { .. } => DomainErrorKind::FutureDate,
            DomainError::NegativeReference { .. } => DomainErrorKind::NegativeReference,
            DomainError::IdentityReassigned { .. } => DomainErrorKind::IdentityReassigned,
        }
    }

    /// Name of the offending field, when the error is about a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DomainError::NullOrEmpty { field }
            | DomainError::InvalidFormat { field, .. }
            | DomainError::OutOfRange { field, .. }
            | DomainError::FutureDate { field }
            | DomainError::NegativeReference { field, .. } => Some(*field),
            DomainError::IdentityReassigned { .. } => None,
        }
    }
}
