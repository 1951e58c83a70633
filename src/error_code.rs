//! Classification of failed service responses.
//!
//! Every non-2xx response from the KappaML API is classified into a
//! [`ServiceErrorCode`], first by a code the service reports in the error body
//! (when it names a known class) and otherwise by HTTP status.
//!
//! | Category    | Codes                                                       |
//! |-------------|-------------------------------------------------------------|
//! | client      | invalid_request, authentication, permission_denied, not_found, request_too_large |
//! | rate        | rate_limited, quota_exhausted                               |
//! | server      | server_error, overloaded, timeout                           |
//! | operational | conflict                                                    |
//! | unknown     | unknown                                                     |
//!
//! ## Example
//!
//! ```rust
//! use kappaml::error_code::ServiceErrorCode;
//!
//! let code = ServiceErrorCode::from_http_status(429);
//! assert_eq!(code.name(), "rate_limited");
//! assert!(code.retryable());
//! assert_eq!(code.category(), "rate");
//! ```

use std::fmt;

/// Error class of a failed KappaML API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceErrorCode {
    /// Malformed request, invalid parameters, or missing required fields
    InvalidRequest,
    /// Invalid, expired, or missing API key
    Authentication,
    /// Valid credentials but insufficient permissions
    PermissionDenied,
    /// Requested model or endpoint does not exist
    NotFound,
    /// Payload exceeds the service limit
    RequestTooLarge,
    /// Request rate limit exceeded
    RateLimited,
    /// Account quota or plan limit reached
    QuotaExhausted,
    /// Internal server error
    ServerError,
    /// Service temporarily unavailable
    Overloaded,
    /// Gateway or service-side timeout
    Timeout,
    /// State conflict (e.g., model name already taken, model still deploying)
    Conflict,
    /// Could not be classified
    Unknown,
}

impl ServiceErrorCode {
    /// Returns the standard name (e.g., `"invalid_request"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Authentication => "authentication",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::RequestTooLarge => "request_too_large",
            Self::RateLimited => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::ServerError => "server_error",
            Self::Overloaded => "overloaded",
            Self::Timeout => "timeout",
            Self::Conflict => "conflict",
            Self::Unknown => "unknown",
        }
    }

    /// Whether a caller-side retry of the same request may succeed.
    ///
    /// The SDK itself never retries; this is a hint for caller retry policies.
    #[inline]
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServerError | Self::Overloaded | Self::Timeout
        )
    }

    /// Returns the category: `"client"`, `"rate"`, `"server"`, `"operational"`, or `"unknown"`.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidRequest
            | Self::Authentication
            | Self::PermissionDenied
            | Self::NotFound
            | Self::RequestTooLarge => "client",
            Self::RateLimited | Self::QuotaExhausted => "rate",
            Self::ServerError | Self::Overloaded | Self::Timeout => "server",
            Self::Conflict => "operational",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a service-reported error code to a class, accepting common aliases.
    pub fn from_service_code(service_code: &str) -> Option<Self> {
        let normalized = service_code.trim().to_ascii_lowercase();
        let code = match normalized.as_str() {
            "invalid_request" | "validation_error" | "bad_request" => Self::InvalidRequest,
            "authentication" | "invalid_api_key" | "unauthorized" => Self::Authentication,
            "permission_denied" | "forbidden" => Self::PermissionDenied,
            "not_found" | "model_not_found" => Self::NotFound,
            "request_too_large" | "payload_too_large" => Self::RequestTooLarge,
            "rate_limited" | "rate_limit_exceeded" => Self::RateLimited,
            "quota_exhausted" | "quota_exceeded" | "model_limit_reached" => Self::QuotaExhausted,
            "server_error" | "internal_error" => Self::ServerError,
            "overloaded" | "service_unavailable" => Self::Overloaded,
            "timeout" => Self::Timeout,
            "conflict" | "already_exists" => Self::Conflict,
            _ => return None,
        };
        Some(code)
    }

    /// Maps an HTTP status code to the most likely class.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 422 => Self::InvalidRequest,
            401 => Self::Authentication,
            402 => Self::QuotaExhausted,
            403 => Self::PermissionDenied,
            404 => Self::NotFound,
            408 | 504 => Self::Timeout,
            409 => Self::Conflict,
            413 => Self::RequestTooLarge,
            429 => Self::RateLimited,
            500 => Self::ServerError,
            502 | 503 => Self::Overloaded,
            _ => Self::Unknown,
        }
    }

    /// Classifies a failed response, preferring a recognized service code over the status.
    pub fn classify(status: u16, service_code: Option<&str>) -> Self {
        service_code
            .and_then(Self::from_service_code)
            .unwrap_or_else(|| Self::from_http_status(status))
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
