//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Each variant corresponds to one error kind a caller can act on. Domain
/// errors from the ledger engine are folded into these at the edges.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation is not allowed in the resource's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Journal entry debits and credits do not match.
    #[error("Unbalanced entry: {0}")]
    UnbalancedEntry(String),

    /// Resource was changed by someone else in the meantime.
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Integrity rule violation (duplicate code, referenced row, ...).
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::InvalidState(_) | Self::ConcurrentModification(_) | Self::Constraint(_) => 409,
            Self::UnbalancedEntry(_) => 422,
            Self::Config(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::UnbalancedEntry(_) => "UNBALANCED_ENTRY",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Constraint(_) => "CONSTRAINT_VIOLATION",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request after re-reading.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::InvalidState(String::new()), 409, "INVALID_STATE")]
    #[case(AppError::UnbalancedEntry(String::new()), 422, "UNBALANCED_ENTRY")]
    #[case(
        AppError::ConcurrentModification(String::new()),
        409,
        "CONCURRENT_MODIFICATION"
    )]
    #[case(AppError::Constraint(String::new()), 409, "CONSTRAINT_VIOLATION")]
    #[case(AppError::Config(String::new()), 500, "CONFIG_ERROR")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_only_concurrent_modification_is_retryable() {
        assert!(AppError::ConcurrentModification("entry".into()).is_retryable());
        assert!(!AppError::InvalidState("entry".into()).is_retryable());
        assert!(!AppError::Database("down".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("msg".into()).to_string(),
            "Validation error: msg"
        );
        assert_eq!(
            AppError::UnbalancedEntry("msg".into()).to_string(),
            "Unbalanced entry: msg"
        );
        assert_eq!(
            AppError::Constraint("msg".into()).to_string(),
            "Constraint violation: msg"
        );
    }

    #[test]
    fn test_from_config_error() {
        let err: AppError = config::ConfigError::NotFound("server.port".into()).into();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("server.port"));
    }
}
