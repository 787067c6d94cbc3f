//! Error types and handling for the Jira tools server
//!
//! Provides structured error types that map to MCP JSON-RPC error codes,
//! converts errors from dependencies into them, and defines [`ToolOutcome`],
//! the result shape of tools that report failures instead of raising them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// Custom error types for the Jira tools server
#[derive(Debug, Error)]
pub enum JiraMcpError {
    /// Configuration errors (-32001)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Authentication failures (-32002)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Network errors (-32003)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Permission denied errors (-32004)
    #[error("Permission denied: {message}")]
    Permission { message: String },

    /// Resource not found errors (-32005)
    #[error("Not found: {resource} '{key}' not found")]
    NotFound { resource: String, key: String },

    /// Invalid parameter errors (-32006)
    #[error("Invalid parameter: {parameter} - {message}")]
    InvalidParameter { parameter: String, message: String },

    /// Requested status has no matching transition (-32006)
    #[error("Status transition to \"{status}\" not available for this issue")]
    TransitionUnavailable { status: String },

    /// The remote service answered with a payload of the wrong shape (-32603)
    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// Internal server errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl JiraMcpError {
    /// Get the MCP JSON-RPC error code for this error
    pub fn error_code(&self) -> i32 {
        match self {
            JiraMcpError::Configuration { .. } => -32001,
            JiraMcpError::Authentication { .. } => -32002,
            JiraMcpError::Network { .. } => -32003,
            JiraMcpError::Permission { .. } => -32004,
            JiraMcpError::NotFound { .. } => -32005,
            JiraMcpError::InvalidParameter { .. } => -32006,
            JiraMcpError::TransitionUnavailable { .. } => -32006,
            JiraMcpError::UnexpectedResponse { .. } => -32603,
            JiraMcpError::Internal { .. } => -32603,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            JiraMcpError::Configuration { .. } => "configuration",
            JiraMcpError::Authentication { .. } => "authentication",
            JiraMcpError::Network { .. } => "network",
            JiraMcpError::Permission { .. } => "permission",
            JiraMcpError::NotFound { .. } => "not_found",
            JiraMcpError::InvalidParameter { .. } => "invalid_parameter",
            JiraMcpError::TransitionUnavailable { .. } => "transition",
            JiraMcpError::UnexpectedResponse { .. } => "unexpected_response",
            JiraMcpError::Internal { .. } => "internal",
        }
    }

    /// Get additional error data for MCP error responses
    pub fn error_data(&self) -> Option<Value> {
        let mut data = serde_json::Map::new();
        data.insert(
            "category".to_string(),
            Value::String(self.category().to_string()),
        );

        match self {
            JiraMcpError::NotFound { resource, key } => {
                data.insert("resource".to_string(), Value::String(resource.clone()));
                data.insert("key".to_string(), Value::String(key.clone()));
            }
            JiraMcpError::InvalidParameter { parameter, .. } => {
                data.insert("parameter".to_string(), Value::String(parameter.clone()));
            }
            JiraMcpError::TransitionUnavailable { status } => {
                data.insert("status".to_string(), Value::String(status.clone()));
            }
            _ => {}
        }

        Some(Value::Object(data))
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        JiraMcpError::Configuration {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        JiraMcpError::Authentication {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        JiraMcpError::Network {
            message: message.into(),
        }
    }

    /// Create a permission error
    pub fn permission(message: impl Into<String>) -> Self {
        JiraMcpError::Permission {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>, key: impl Into<String>) -> Self {
        JiraMcpError::NotFound {
            resource: resource.into(),
            key: key.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        JiraMcpError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    /// Create a transition-unavailable error for the requested status name
    pub fn transition_unavailable(status: impl Into<String>) -> Self {
        JiraMcpError::TransitionUnavailable {
            status: status.into(),
        }
    }

    /// Create an unexpected response error
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        JiraMcpError::UnexpectedResponse {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        JiraMcpError::Internal {
            message: message.into(),
        }
    }
}

/// Convert from gouqi errors to JiraMcpError
impl From<gouqi::Error> for JiraMcpError {
    fn from(err: gouqi::Error) -> Self {
        match err {
            gouqi::Error::Http(_) => JiraMcpError::network(format!("HTTP error: {}", err)),
            gouqi::Error::IO(_) => JiraMcpError::network(format!("IO error: {}", err)),
            gouqi::Error::Serde(_) => {
                JiraMcpError::internal(format!("Serialization error: {}", err))
            }
            gouqi::Error::Unauthorized => JiraMcpError::auth("JIRA authentication failed"),
            gouqi::Error::NotFound => JiraMcpError::not_found("resource", "unknown"),
            gouqi::Error::Fault { .. } => {
                JiraMcpError::internal(format!("JIRA API error: {}", err))
            }
            _ => JiraMcpError::internal(format!("JIRA client error: {}", err)),
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for JiraMcpError {
    fn from(err: serde_json::Error) -> Self {
        JiraMcpError::internal(format!("JSON error: {}", err))
    }
}

/// Convert from TOML parsing errors
impl From<toml::de::Error> for JiraMcpError {
    fn from(err: toml::de::Error) -> Self {
        JiraMcpError::config(format!("TOML parsing error: {}", err))
    }
}

/// Convert from generic anyhow errors
impl From<anyhow::Error> for JiraMcpError {
    fn from(err: anyhow::Error) -> Self {
        // Try to determine the category based on the error message
        let message = format!("{:#}", err);
        let lower_message = message.to_lowercase();

        if lower_message.contains("authentication") || lower_message.contains("unauthorized") {
            JiraMcpError::auth(message)
        } else if lower_message.contains("permission")
            || lower_message.contains("forbidden")
            || lower_message.contains("403")
        {
            JiraMcpError::permission(message)
        } else if lower_message.contains("network")
            || lower_message.contains("connection")
            || lower_message.contains("timeout")
        {
            JiraMcpError::network(message)
        } else if lower_message.contains("config") {
            JiraMcpError::config(message)
        } else {
            JiraMcpError::internal(message)
        }
    }
}

/// Result type alias for Jira tools operations
pub type JiraMcpResult<T> = Result<T, JiraMcpError>;

/// Result of a tool that reports failures as data instead of raising them
///
/// Serializes untagged: a success is the bare value, a failure is
/// `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolOutcome<T> {
    Failure { error: String },
    Success(T),
}

impl<T> ToolOutcome<T> {
    /// Build a failure outcome from any displayable error
    pub fn failure(error: impl std::fmt::Display) -> Self {
        ToolOutcome::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// The reported error message, if this is a failure
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Failure { error } => Some(error),
            ToolOutcome::Success(_) => None,
        }
    }

    pub fn into_success(self) -> Option<T> {
        match self {
            ToolOutcome::Success(value) => Some(value),
            ToolOutcome::Failure { .. } => None,
        }
    }
}

impl<T> From<JiraMcpResult<T>> for ToolOutcome<T> {
    fn from(result: JiraMcpResult<T>) -> Self {
        match result {
            Ok(value) => ToolOutcome::Success(value),
            Err(e) => {
                warn!(category = e.category(), "Reporting failure to caller: {}", e);
                ToolOutcome::failure(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_codes() {
        assert_eq!(JiraMcpError::config("test").error_code(), -32001);
        assert_eq!(JiraMcpError::auth("test").error_code(), -32002);
        assert_eq!(JiraMcpError::network("test").error_code(), -32003);
        assert_eq!(JiraMcpError::permission("test").error_code(), -32004);
        assert_eq!(
            JiraMcpError::not_found("issue", "KEY-123").error_code(),
            -32005
        );
        assert_eq!(
            JiraMcpError::invalid_param("status", "invalid").error_code(),
            -32006
        );
        assert_eq!(
            JiraMcpError::transition_unavailable("Done").error_code(),
            -32006
        );
        assert_eq!(
            JiraMcpError::unexpected_response("list").error_code(),
            -32603
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(JiraMcpError::config("test").category(), "configuration");
        assert_eq!(JiraMcpError::auth("test").category(), "authentication");
        assert_eq!(JiraMcpError::network("test").category(), "network");
        assert_eq!(
            JiraMcpError::not_found("issue", "KEY-123").category(),
            "not_found"
        );
        assert_eq!(
            JiraMcpError::unexpected_response("x").category(),
            "unexpected_response"
        );
    }

    #[test]
    fn test_error_data() {
        let not_found_error = JiraMcpError::not_found("issue", "KEY-123");
        let data = not_found_error.error_data().unwrap();

        assert_eq!(data["category"], "not_found");
        assert_eq!(data["resource"], "issue");
        assert_eq!(data["key"], "KEY-123");

        let data = JiraMcpError::transition_unavailable("Done")
            .error_data()
            .unwrap();
        assert_eq!(data["status"], "Done");
    }

    #[test]
    fn test_transition_unavailable_message() {
        let err = JiraMcpError::transition_unavailable("In Review");
        assert_eq!(
            err.to_string(),
            "Status transition to \"In Review\" not available for this issue"
        );
    }

    #[test]
    fn test_anyhow_conversion() {
        let auth_error = anyhow::anyhow!("Authentication failed");
        let jira_error: JiraMcpError = auth_error.into();
        assert_eq!(jira_error.category(), "authentication");

        let config_error = anyhow::anyhow!("Failed to parse config file: jira.toml");
        let jira_error: JiraMcpError = config_error.into();
        assert_eq!(jira_error.category(), "configuration");
    }

    #[test]
    fn test_tool_outcome_serialization() {
        let ok: ToolOutcome<serde_json::Value> = ToolOutcome::Success(json!({"key": "ENG-1"}));
        assert_eq!(serde_json::to_value(&ok).unwrap(), json!({"key": "ENG-1"}));

        let failed: ToolOutcome<serde_json::Value> =
            Err(JiraMcpError::network("connection reset")).into();
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"error": "Network error: connection reset"})
        );
        assert_eq!(
            failed.error_message(),
            Some("Network error: connection reset")
        );
        assert!(!failed.is_success());
    }
}
