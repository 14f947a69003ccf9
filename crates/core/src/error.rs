//! Error types for the Ctrl Dot guard.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! [`GuardError`] covers everything the guard itself can fail with; the
//! capability errors ([`ProviderError`], [`ToolError`]) carry it in a
//! transparent `Guard` variant so a guarded wrapper can stand in for the
//! capability it wraps without re-typing the delegate's own failures.

use thiserror::Error;

use crate::decision::DecisionKind;

/// Result type alias for guard operations.
pub type GuardResult<T> = std::result::Result<T, GuardError>;

/// Failures raised by the guard before the wrapped capability runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardError {
    /// The policy authority could not be reached (connect failure or timeout).
    #[error("Cannot connect to Ctrl Dot daemon at {base_url}: {reason}. Is the daemon running?")]
    Unreachable { base_url: String, reason: String },

    /// The policy authority answered DENY or STOP.
    #[error("Ctrl Dot denied action: {decision} - {reason}")]
    Denied { decision: DecisionKind, reason: String },

    /// A response that is neither a decision nor a recognised denial.
    #[error("HTTP {status}: {message}")]
    Protocol { status: u16, message: String },

    /// The proposal failed local validation and was never sent.
    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    /// An identifier that cannot be used as a single URL path segment.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl GuardError {
    /// Whether this error is a policy denial (DENY or STOP).
    pub fn is_denied(&self) -> bool {
        matches!(self, GuardError::Denied { .. })
    }

    /// The policy authority's reason, when this is a denial.
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            GuardError::Denied { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// --- Capability errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error(transparent)]
    Guard(#[from] GuardError),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Permission denied: {tool_name}: {reason}")]
    PermissionDenied { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Guard(#[from] GuardError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_names_base_url() {
        let err = GuardError::Unreachable {
            base_url: "http://127.0.0.1:7777".into(),
            reason: "connection refused".into(),
        };
        assert!(err.to_string().contains("http://127.0.0.1:7777"));
        assert!(err.to_string().contains("Cannot connect"));
    }

    #[test]
    fn denied_displays_decision_and_reason() {
        let err = GuardError::Denied {
            decision: DecisionKind::Stop,
            reason: "Budget exhausted".into(),
        };
        assert_eq!(err.to_string(), "Ctrl Dot denied action: STOP - Budget exhausted");
        assert!(err.is_denied());
        assert_eq!(err.denial_reason(), Some("Budget exhausted"));
    }

    #[test]
    fn guard_error_is_transparent_inside_provider_error() {
        let err: ProviderError = GuardError::Protocol {
            status: 502,
            message: "bad gateway".into(),
        }
        .into();
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
        assert!(matches!(err, ProviderError::Guard(GuardError::Protocol { status: 502, .. })));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = ToolError::PermissionDenied {
            tool_name: "shell".into(),
            reason: "command not in allowlist".into(),
        };
        assert!(err.to_string().contains("shell"));
        assert!(err.to_string().contains("allowlist"));
    }
}
