//! Error types for the form schema layer.

use thiserror::Error;

use crate::validator::ValidationError;

/// Result type for form schema operations.
pub type FormResult<T> = Result<T, FormError>;

/// Error type for schema registration, lookup, and validation.
#[derive(Debug, Error)]
pub enum FormError {
    /// The requested schema id is not registered.
    #[error("Schema not found: {id}")]
    SchemaNotFound { id: String },

    /// A schema with this id is already registered.
    #[error("Schema already registered: {id}")]
    DuplicateSchema { id: String },

    /// The payload violated one or more schema constraints.
    ///
    /// Carries every violation found, never just the first one.
    #[error("Validation failed for schema '{schema_id}'")]
    Validation {
        schema_id: String,
        errors: Vec<ValidationError>,
    },
}

impl FormError {
    /// Creates a schema-not-found error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::SchemaNotFound { id: id.into() }
    }

    /// Creates a duplicate-schema error.
    pub fn duplicate(id: impl Into<String>) -> Self {
        Self::DuplicateSchema { id: id.into() }
    }

    /// Creates a validation error from collected violations.
    pub fn validation(schema_id: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self::Validation {
            schema_id: schema_id.into(),
            errors,
        }
    }

    /// Returns true if this error was caused by client input (vs configuration).
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::SchemaNotFound { .. } | Self::Validation { .. })
    }

    /// Returns an HTTP status code appropriate for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaNotFound { .. } => 404,
            Self::DuplicateSchema { .. } => 409,
            Self::Validation { .. } => 400,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{ValidationError, ViolationCode};

    #[test]
    fn test_error_display() {
        let err = FormError::not_found("userRegistration");
        assert_eq!(err.to_string(), "Schema not found: userRegistration");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(FormError::not_found("x").status_code(), 404);
        assert_eq!(FormError::duplicate("x").status_code(), 409);
        assert_eq!(FormError::validation("x", vec![]).status_code(), 400);
    }

    #[test]
    fn test_is_user_error() {
        let violation = ValidationError::new("email", ViolationCode::Format, "Invalid format");
        assert!(FormError::validation("contactForm", vec![violation]).is_user_error());
        assert!(!FormError::duplicate("contactForm").is_user_error());
    }
}
