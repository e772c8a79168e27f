//! Error types for KabaddiGuru
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Detail text the chat endpoint returns once a free-tier user runs out of chats
pub const QUOTA_EXCEEDED_MARKER: &str = "Free trial limit reached";

/// Main error type for KabaddiGuru operations
///
/// This enum covers configuration loading, local validation, backend
/// responses, connectivity failures, local persistence and email relay.
#[derive(Error, Debug)]
pub enum GuruError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Form or input validation errors (never sent to the network)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors (bad credentials, expired token)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The backend refused a chat because the free-tier quota is exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Non-2xx response from the backend
    #[error("HTTP error {status}: {body}")]
    Http {
        /// Response status code
        status: u16,
        /// Raw response body (JSON re-serialised, or text)
        body: String,
        /// The `detail` field of a JSON error body, when present
        detail: Option<String>,
    },

    /// The backend could not be reached at all
    #[error("Network error: Unable to reach backend at {base_url}: {message}")]
    Network {
        /// Base URL the client was configured with
        base_url: String,
        /// Underlying transport failure
        message: String,
    },

    /// The backend answered 2xx but reported failure (`success: false`)
    #[error("Backend error: {0}")]
    Backend(String),

    /// A 2xx response body could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Local persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Email relay errors
    #[error("Email error: {0}")]
    Email(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GuruError {
    /// Returns `true` when this error signals an exhausted chat quota.
    ///
    /// The backend reports the condition as an error `detail` on `/chat`, so
    /// HTTP errors are matched on their detail text as well.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            GuruError::QuotaExceeded(_) => true,
            GuruError::Http { detail, body, .. } => detail
                .as_deref()
                .unwrap_or(body.as_str())
                .contains(QUOTA_EXCEEDED_MARKER),
            _ => false,
        }
    }

    /// Returns `true` for connectivity failures (as opposed to HTTP status errors)
    pub fn is_network(&self) -> bool {
        matches!(self, GuruError::Network { .. })
    }

    /// Human-readable text suitable for a toast-style notice
    pub fn user_message(&self) -> String {
        match self {
            GuruError::Http {
                detail: Some(detail),
                ..
            } => detail.clone(),
            GuruError::Network { base_url, .. } => format!(
                "Cannot reach the KabaddiGuru server at {}. Check that it is running and try again.",
                base_url
            ),
            GuruError::Validation(msg)
            | GuruError::Authentication(msg)
            | GuruError::QuotaExceeded(msg)
            | GuruError::Backend(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for KabaddiGuru operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Returns `true` if `err` wraps a quota-exceeded [`GuruError`]
pub fn is_quota_exceeded(err: &anyhow::Error) -> bool {
    err.downcast_ref::<GuruError>()
        .map(GuruError::is_quota_exceeded)
        .unwrap_or(false)
}

/// Returns `true` if `err` wraps a connectivity [`GuruError`]
pub fn is_network(err: &anyhow::Error) -> bool {
    err.downcast_ref::<GuruError>()
        .map(GuruError::is_network)
        .unwrap_or(false)
}

/// Best-effort human-readable text for any error
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<GuruError>() {
        Some(e) => e.user_message(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = GuruError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_validation_error_display() {
        let error = GuruError::Validation("Invalid email format".to_string());
        assert_eq!(error.to_string(), "Validation error: Invalid email format");
    }

    #[test]
    fn test_http_error_display() {
        let error = GuruError::Http {
            status: 500,
            body: "boom".to_string(),
            detail: None,
        };
        assert_eq!(error.to_string(), "HTTP error 500: boom");
    }

    #[test]
    fn test_network_error_display_mentions_base_url() {
        let error = GuruError::Network {
            base_url: "http://localhost:8000".to_string(),
            message: "connection refused".to_string(),
        };
        let s = error.to_string();
        assert!(s.contains("Unable to reach backend at http://localhost:8000"));
        assert!(error.is_network());
        assert!(!error.is_quota_exceeded());
    }

    #[test]
    fn test_quota_detected_from_http_detail() {
        let error = GuruError::Http {
            status: 401,
            body: r#"{"detail":"Free trial limit reached. Please upgrade to premium for unlimited chats."}"#
                .to_string(),
            detail: Some(
                "Free trial limit reached. Please upgrade to premium for unlimited chats."
                    .to_string(),
            ),
        };
        assert!(error.is_quota_exceeded());
    }

    #[test]
    fn test_quota_not_detected_for_generic_http_error() {
        let error = GuruError::Http {
            status: 401,
            body: r#"{"detail":"Invalid token"}"#.to_string(),
            detail: Some("Invalid token".to_string()),
        };
        assert!(!error.is_quota_exceeded());
        assert_eq!(error.user_message(), "Invalid token");
    }

    #[test]
    fn test_anyhow_helpers_downcast() {
        let err: anyhow::Error = GuruError::QuotaExceeded("limit".to_string()).into();
        assert!(is_quota_exceeded(&err));
        assert!(!is_network(&err));

        let plain = anyhow::anyhow!("something else");
        assert!(!is_quota_exceeded(&plain));
        assert_eq!(user_message(&plain), "something else");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: GuruError = json_error.into();
        assert!(matches!(error, GuruError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: GuruError = yaml_error.into();
        assert!(matches!(error, GuruError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GuruError>();
    }
}
