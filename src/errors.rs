/// Domain-specific error types for divequery
///
/// The ranking engine itself never fails: malformed text, unknown intents and
/// empty candidate sets all degrade to fewer results. These errors only surface
/// from the ambient layers (configuration, catalog loading, CLI input).

#[derive(Debug, thiserror::Error)]
pub enum DiveQueryError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>
    },

    #[error("Not found: {id}")]
    NotFound {
        id: String
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DiveQueryError {
    fn from(e: std::io::Error) -> Self {
        DiveQueryError::Catalog(e.to_string())
    }
}

impl From<serde_json::Error> for DiveQueryError {
    fn from(e: serde_json::Error) -> Self {
        DiveQueryError::Catalog(format!("Invalid JSON: {}", e))
    }
}

impl DiveQueryError {
    /// Helper to create validation errors with field names
    ///
    /// Example:
    /// ```
    /// use divequery::errors::DiveQueryError;
    /// let err = DiveQueryError::validation("intent_type", "Intent type cannot be empty");
    /// ```
    pub fn validation(field: &str, message: &str) -> Self {
        DiveQueryError::Validation {
            message: message.to_string(),
            field: Some(field.to_string()),
        }
    }

    /// Helper for lookups by numeric id (users, organizations, levels).
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        DiveQueryError::NotFound {
            id: format!("{} {}", kind, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_carries_field() {
        match DiveQueryError::validation("keywords", "must not be empty") {
            DiveQueryError::Validation { message, field } => {
                assert_eq!(message, "must not be empty");
                assert_eq!(field.as_deref(), Some("keywords"));
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_json_error_maps_to_catalog() {
        let err: DiveQueryError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, DiveQueryError::Catalog(_)));
        assert!(err.to_string().starts_with("Catalog error: Invalid JSON"));
    }
}
