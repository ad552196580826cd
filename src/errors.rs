//! Typed error hierarchy for docket.
//!
//! Four enums cover the library seams:
//! - `SourceError`: collection service failures (listing and creation)
//! - `SelectorError`: malformed navigation query parameters
//! - `CoordinatorError`: coordinator handle failures
//! - `ConfigError`: invalid `docket.toml` values

use thiserror::Error;

/// Errors from the collection service and the collection source.
///
/// Neither variant is retried; both reach the page unmodified.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to list entities: {0}")]
    Fetch(#[source] anyhow::Error),

    #[error("Failed to create entity for recipient {recipient_id}: {source}")]
    Create {
        recipient_id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl SourceError {
    /// Check if this error came from a creation request.
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }
}

/// Errors from parsing a selector out of navigation query parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("Query parameter '{0}' is present but empty")]
    EmptyParam(String),

    #[error("Malformed query segment '{0}'")]
    MalformedSegment(String),
}

/// Errors from talking to a running coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Coordinator has been disposed")]
    Disposed,

    #[error("Coordinator task failed: {0}")]
    TaskFailed(#[source] tokio::task::JoinError),
}

/// Errors from configuration values that parse but make no sense.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid page_size {0}: must be at least 1")]
    InvalidPageSize(usize),

    #[error("Invalid log level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid {field} '{value}'")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_create_carries_recipient() {
        let err = SourceError::Create {
            recipient_id: "C".to_string(),
            source: anyhow::anyhow!("backend returned 500"),
        };
        assert!(err.is_create());
        let msg = err.to_string();
        assert!(msg.contains("recipient C"));
        assert!(msg.contains("500"));
    }

    #[test]
    fn source_error_fetch_is_not_create() {
        let err = SourceError::Fetch(anyhow::anyhow!("timeout"));
        assert!(!err.is_create());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn selector_error_names_param() {
        let err = SelectorError::EmptyParam("recipientId".to_string());
        assert!(err.to_string().contains("recipientId"));
    }

    #[test]
    fn config_error_page_size_is_matchable() {
        let err = ConfigError::InvalidPageSize(0);
        assert!(matches!(err, ConfigError::InvalidPageSize(0)));
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&SourceError::Fetch(anyhow::anyhow!("x")));
        assert_std_error(&SelectorError::MalformedSegment("=".into()));
        assert_std_error(&CoordinatorError::Disposed);
        assert_std_error(&ConfigError::InvalidLogLevel("loud".into()));
    }
}
