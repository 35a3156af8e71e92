//! Request Validation Module
//!
//! Input length checks and sanitization for player-supplied text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;

/// Validation error types
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField { field: String },

    #[error("Field '{field}' is too long (max: {max}, got: {got})")]
    TooLong {
        field: String,
        max: usize,
        got: usize,
    },

    #[error("Field '{field}' is too short (min: {min}, got: {got})")]
    TooShort {
        field: String,
        min: usize,
        got: usize,
    },

    #[error("Field '{field}' has an unsupported value: {value}")]
    UnknownOption { field: String, value: String },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field } => field.as_str(),
            Self::TooLong { field, .. } => field.as_str(),
            Self::TooShort { field, .. } => field.as_str(),
            Self::UnknownOption { field, .. } => field.as_str(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Validation result type
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Request validator implementation
#[derive(Debug, Clone)]
pub struct RequestValidator {
    /// Maximum allowed field length
    max_field_length: usize,
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestValidator {
    /// Create new validator
    pub fn new() -> Self {
        Self {
            max_field_length: 10_000,
        }
    }

    /// Validate field length, counted in characters
    pub fn validate_length(
        &self,
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> ValidationResult<()> {
        let length = value.chars().count();

        if length == 0 && min.is_some_and(|m| m > 0) {
            return Err(ValidationError::MissingField {
                field: field.to_string(),
            });
        }

        if let Some(min_len) = min {
            if length < min_len {
                return Err(ValidationError::TooShort {
                    field: field.to_string(),
                    min: min_len,
                    got: length,
                });
            }
        }

        let max_len = max.unwrap_or(self.max_field_length);
        if length > max_len {
            return Err(ValidationError::TooLong {
                field: field.to_string(),
                max: max_len,
                got: length,
            });
        }

        Ok(())
    }

    /// Parse a value from a fixed option set
    pub fn validate_option<T: std::str::FromStr>(
        &self,
        field: &str,
        value: &str,
    ) -> ValidationResult<T> {
        value.parse().map_err(|_| ValidationError::UnknownOption {
            field: field.to_string(),
            value: value.to_string(),
        })
    }

    /// Sanitize string input
    pub fn sanitize_string(input: &str) -> String {
        // Remove null bytes and control characters
        input
            .trim()
            .chars()
            .filter(|c| !c.is_control())
            .collect()
    }
}

/// Common validation helpers
pub mod validators {
    use super::*;

    /// Maximum character name length
    pub const MAX_NAME_LENGTH: usize = 100;

    /// Validate and normalize a character name
    pub fn validate_character_name(name: &str) -> ValidationResult<String> {
        let name = RequestValidator::sanitize_string(name);
        RequestValidator::new().validate_length("name", &name, Some(1), Some(MAX_NAME_LENGTH))?;
        Ok(name)
    }

    /// Validate player choice text
    pub fn validate_choice_text(choice: &str, max_length: usize) -> ValidationResult<()> {
        let validator = RequestValidator::new();
        validator.validate_length("choice_text", choice.trim(), Some(1), None)?;
        validator.validate_length("choice_text", choice, None, Some(max_length))
    }
}
