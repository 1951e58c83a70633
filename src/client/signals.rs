use crate::transport::SessionState;

/// A snapshot of the client's session "signals".
///
/// Facts only: applications can use it to verify resource release or to drive
/// their own observability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSignals {
    pub state: SessionState,
    /// Requests handed to the transport since the client was built.
    pub requests_sent: u64,
    /// Times the HTTP session was released. Never exceeds one.
    pub releases: u32,
}
