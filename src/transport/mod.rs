//! HTTP plumbing: the scoped session resource and transport-level errors.

pub mod http;

pub use http::{HttpSession, RawResponse, SessionState, TransportError};
