//! # Fixture Errors
//!
//! Error handling for the Alfresco container fixtures.
//!
//! - Uses `thiserror` for structured error definitions
//! - Named fields on every variant so messages stay self-describing

use thiserror::Error;

/// Errors raised while building, starting or stopping the container stack.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixtureError {
    #[error("Invalid image reference {reference}: expected an image of {expected}")]
    InvalidImageReference { reference: String, expected: String },

    #[error("Malformed image reference {reference:?}: {reason}")]
    MalformedImageReference { reference: String, reason: String },

    #[error("Container {container} was not ready within {timeout_secs}s")]
    StartupTimeout { container: String, timeout_secs: u64 },

    #[error("Failed to stop {} container(s): {}", failures.len(), failures.join("; "))]
    StopFailure { failures: Vec<String> },

    #[error("Cannot {operation} while fixture is {state}")]
    InvalidState { operation: String, state: String },

    #[error("Container {container} has not been started")]
    NotStarted { container: String },

    #[error("Invalid fixture settings: {reason}")]
    InvalidSettings { reason: String },

    #[error("Container runtime failed to {operation}: {reason}")]
    Runtime { operation: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Http { url: String, reason: String }
}

impl FixtureError {
    /// Shorthand for a [`FixtureError::Runtime`] built from any displayable cause.
    pub fn runtime(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Runtime {
            operation: operation.into(),
            reason: reason.to_string()
        }
    }

    /// Returns true when the error came from a readiness probe that never passed.
    #[must_use]
    pub fn is_startup_timeout(&self) -> bool {
        matches!(self, Self::StartupTimeout { .. })
    }
}

/// Convenience alias used across the workspace.
pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_failure_lists_every_container() {
        let err = FixtureError::StopFailure {
            failures: vec![
                "alfresco: daemon gone".to_string(),
                "postgres: timeout".to_string(),
            ]
        };
        let message = err.to_string();
        assert!(message.starts_with("Failed to stop 2 container(s)"));
        assert!(message.contains("alfresco: daemon gone; postgres: timeout"));
    }

    #[test]
    fn test_runtime_shorthand() {
        let err = FixtureError::runtime("start postgres", "image not found");
        assert_eq!(
            err,
            FixtureError::Runtime {
                operation: "start postgres".to_string(),
                reason: "image not found".to_string()
            }
        );
        assert!(!err.is_startup_timeout());
    }

    #[test]
    fn test_malformed_image_reference_display() {
        let err = FixtureError::MalformedImageReference {
            reference: "alfresco repo".to_string(),
            reason: "contains whitespace".to_string()
        };
        assert_eq!(
            err.to_string(),
            "Malformed image reference \"alfresco repo\": contains whitespace"
        );
    }

    #[test]
    fn test_startup_timeout_display() {
        let err = FixtureError::StartupTimeout {
            container: "alfresco".to_string(),
            timeout_secs: 180
        };
        assert!(err.is_startup_timeout());
        assert_eq!(err.to_string(), "Container alfresco was not ready within 180s");
    }
}
