use crate::error_code::ServiceErrorCode;
use crate::transport::TransportError;
use crate::types::DeploymentState;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Setting or request field that caused the error (e.g., "api_key", "create_model.timeout")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected values, offending input)
    pub details: Option<String>,
    /// Source of the error (e.g., "config", "deployment")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Why a deployment wait ended without the model becoming ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentFailure {
    /// The service reported a terminal failure status.
    Failed,
    /// The wall-clock deadline passed before the service reported the model deployed.
    TimedOut { waited: Duration },
}

impl DeploymentFailure {
    /// Terminal state of the deployment-wait state machine.
    pub fn state(&self) -> DeploymentState {
        match self {
            DeploymentFailure::Failed => DeploymentState::Failed,
            DeploymentFailure::TimedOut { .. } => DeploymentState::TimedOut,
        }
    }
}

impl fmt::Display for DeploymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentFailure::Failed => write!(f, "deployment failed"),
            DeploymentFailure::TimedOut { waited } => {
                write!(f, "deployment timed out after {:.1}s", waited.as_secs_f64())
            }
        }
    }
}

/// Unified error type for the KappaML SDK.
///
/// Usage errors (`Configuration`, `Validation`, `SessionClosed`) are raised locally
/// before any network call. Everything the service or the network reports ends up
/// in one of the remaining variants; raw transport errors never escape unwrapped.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Session closed: the client's HTTP session was released; create a new client")]
    SessionClosed,

    #[error("Model {model_id} not found")]
    ModelNotFound { model_id: String },

    #[error("Model {model_id} deployment error: {failure}")]
    Deployment {
        model_id: String,
        failure: DeploymentFailure,
    },

    #[error("Remote error: HTTP {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: ServiceErrorCode,
        /// Error code reported by the service body, when present.
        service_code: Option<String>,
        message: String,
        request_id: Option<String>,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected response: {message}{}", format_context(.context))]
    UnexpectedResponse {
        message: String,
        context: ErrorContext,
    },

    #[error("Operation cancelled: {operation}")]
    Cancelled { operation: String },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn unexpected_response(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::UnexpectedResponse {
            message: msg.into(),
            context,
        }
    }

    /// Local misuse caught before any request was sent.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::Configuration { .. } | Error::Validation { .. } | Error::SessionClosed
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ModelNotFound { .. })
    }

    pub fn is_deployment(&self) -> bool {
        matches!(self, Error::Deployment { .. })
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Deployment { failure, .. } => {
                matches!(failure, DeploymentFailure::TimedOut { .. })
            }
            Error::Transport(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Unclassified failures: the remote reported an error the taxonomy has no
    /// dedicated variant for, the network failed, or the body could not be decoded.
    pub fn is_sdk(&self) -> bool {
        matches!(
            self,
            Error::Remote { .. }
                | Error::Transport(_)
                | Error::Serialization(_)
                | Error::UnexpectedResponse { .. }
        )
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::UnexpectedResponse { context, .. } => Some(context),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_message() {
        let err = Error::validation_with_context(
            "timeout must be positive",
            ErrorContext::new()
                .with_field_path("create_model.timeout")
                .with_source("deployment"),
        );
        assert_eq!(
            err.to_string(),
            "Validation error: timeout must be positive (field: create_model.timeout, source: deployment)"
        );
        assert!(err.is_usage());
        assert!(!err.is_sdk());
    }

    #[test]
    fn test_deployment_timeout_is_timeout() {
        let err = Error::Deployment {
            model_id: "m-1".into(),
            failure: DeploymentFailure::TimedOut {
                waited: Duration::from_millis(1500),
            },
        };
        assert!(err.is_deployment());
        assert!(err.is_timeout());
        if let Error::Deployment { failure, .. } = &err {
            assert_eq!(failure.state(), DeploymentState::TimedOut);
        }
        assert_eq!(
            err.to_string(),
            "Model m-1 deployment error: deployment timed out after 1.5s"
        );

        let failed = Error::Deployment {
            model_id: "m-1".into(),
            failure: DeploymentFailure::Failed,
        };
        assert!(!failed.is_timeout());
    }

    #[test]
    fn test_taxonomy_buckets_are_disjoint() {
        let not_found = Error::ModelNotFound {
            model_id: "x".into(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_sdk());
        assert!(!not_found.is_usage());

        let remote = Error::Remote {
            status: 500,
            code: ServiceErrorCode::ServerError,
            service_code: None,
            message: "boom".into(),
            request_id: None,
        };
        assert!(remote.is_sdk());
        assert!(!remote.is_not_found());
        assert!(Error::SessionClosed.is_usage());
    }
}
