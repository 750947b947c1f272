//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, malformed identifiers, and schema errors.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ID parsing error for a principal (AAD) or resource (ARM) identifier
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// An ARM resource path did not contain the expected `/subscriptions/.../providers/...` shape
    #[error("Invalid ARM resource path: {0}")]
    InvalidResourcePath(String),

    /// A relationship's name was not in the closed relation-name vocabulary
    #[error("Invalid relation name: {0}")]
    InvalidRelationName(String),

    /// An ARM api-version string did not parse or the server's suggestion list was empty
    #[error("Invalid api version: {0}")]
    InvalidApiVersion(String),

    /// A `tags` value could not be flattened into the alternating key/value list
    #[error("Invalid tag value: {0}")]
    InvalidTagValue(String),

    /// The requested or configured cloud profile name is not recognized and no custom config was supplied
    #[error("Invalid cloud profile: {0}")]
    InvalidCloudProfile(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// An entity schema required a field that was absent from the record
    #[error("Missing required field {field} on {class}")]
    MissingField {
        /// The class/type being parsed
        class: String,
        /// The field that was expected
        field: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("not-a-uuid".to_string());
        assert_eq!(err.to_string(), "Invalid ID format: not-a-uuid");

        let err = DomainError::MissingField {
            class: "KeyVault".to_string(),
            field: "properties.vaultUri".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required field properties.vaultUri on KeyVault"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidResourcePath("/bad".to_string());
        let err2 = DomainError::InvalidResourcePath("/bad".to_string());
        let err3 = DomainError::InvalidResourcePath("/other".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn test_error_clone() {
        let err = DomainError::ValidationFailed("test".to_string());
        let cloned = err.clone();
        assert_eq!(err, cloned);
    }
}
