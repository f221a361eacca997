//! Login flow error types.

use thiserror::Error;

pub type FlowResult<T> = Result<T, FlowError>;

/// Generic text shown to users for any failed login attempt.
pub const USER_FACING_FAILURE: &str = "Login failed, please try again.";

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("OIDC discovery failed with HTTP status {status}")]
    DiscoveryStatus { status: u16 },

    #[error("OIDC discovery document is missing required field `{0}`")]
    DiscoveryMissingField(&'static str),

    #[error("OIDC discovery timed out after {timeout_seconds}s")]
    DiscoveryTimeout { timeout_seconds: u64 },

    #[error("Invalid OIDC discovery document: {0}")]
    InvalidDiscoveryDocument(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Navigation blocked: {0}")]
    NavigationBlocked(String),

    #[error("Secure random source unavailable: {0}")]
    RandomUnavailable(String),

    #[error("Flow storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

/// Coarse error category, used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowErrorKind {
    /// Bad or unsupported provider configuration, raised at build time.
    Configuration,
    /// The issuer's discovery document could not be obtained or used.
    Discovery,
    /// The host refused to navigate or inject the SAML form.
    Navigation,
    /// A required host capability (randomness, storage) failed.
    Environment,
}

impl FlowError {
    pub fn kind(&self) -> FlowErrorKind {
        match self {
            FlowError::UnknownProvider(_)
            | FlowError::MissingField(_)
            | FlowError::ConfigError(_)
            | FlowError::UrlError(_) => FlowErrorKind::Configuration,
            FlowError::DiscoveryStatus { .. }
            | FlowError::DiscoveryMissingField(_)
            | FlowError::DiscoveryTimeout { .. }
            | FlowError::InvalidDiscoveryDocument(_)
            | FlowError::HttpError(_) => FlowErrorKind::Discovery,
            FlowError::NavigationBlocked(_) => FlowErrorKind::Navigation,
            FlowError::RandomUnavailable(_)
            | FlowError::StorageError(_)
            | FlowError::SerializationError(_)
            | FlowError::EncodingError(_) => FlowErrorKind::Environment,
        }
    }

    /// Message safe to display to the end user. Never contains provider or
    /// discovery details.
    pub fn user_message(&self) -> &'static str {
        USER_FACING_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_status_message_contains_status() {
        let err = FlowError::DiscoveryStatus { status: 404 };
        assert!(err.to_string().contains("404"));
        assert_eq!(err.kind(), FlowErrorKind::Discovery);
    }

    #[test]
    fn test_missing_field_message_names_field() {
        let err = FlowError::DiscoveryMissingField("authorization_endpoint");
        assert!(err.to_string().contains("authorization_endpoint"));
    }

    #[test]
    fn test_user_message_hides_details() {
        let err = FlowError::UnknownProvider("acme-internal".to_string());
        assert_eq!(err.kind(), FlowErrorKind::Configuration);
        assert!(!err.user_message().contains("acme-internal"));
        assert_eq!(err.user_message(), USER_FACING_FAILURE);
    }
}
