//! Error types for session tracking.

use bloxpresence_protocol::ProtocolError;

/// Errors reported by a [`PresenceSink`](crate::PresenceSink).
#[derive(Debug, thiserror::Error)]
pub enum PresenceError {
    #[error("presence client unavailable: {0}")]
    Unavailable(String),

    #[error("presence update rejected: {0}")]
    Rejected(String),
}

/// Errors surfaced by [`SessionStateMachine::handle_line`](crate::SessionStateMachine::handle_line).
///
/// Lines that merely fail to match are never errors; only collaborator
/// failures are reported, and none of them is fatal to the machine.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid in-game message: {0}")]
    Message(#[from] ProtocolError),

    #[error("presence error: {0}")]
    Presence(#[from] PresenceError),
}
