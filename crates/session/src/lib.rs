//! Log-driven session tracking for the game client.
//!
//! The client never reports its session state directly, so it is inferred
//! from known log lines. [`LineMatcher`] recognizes those lines and extracts
//! their fields; [`SessionStateMachine`] folds the matches, in file order,
//! into a [`SessionState`] and tells a [`PresenceSink`] when a session starts,
//! ends, or receives an in-game message.
//!
//! # Lifecycle
//!
//! - **Idle**: no join in progress. A private-server marker may pin the
//!   server type of the next join.
//! - **Joining**: a join line was seen; waiting for the server to confirm
//!   the address it announced.
//! - **InGame**: the join was confirmed. Disconnect returns to idle;
//!   teleport markers arm the classification of the next join.

pub mod error;
pub mod machine;
pub mod marker;
pub mod sink;
pub mod state;

// Re-export primary types for convenience.
pub use error::{PresenceError, SessionError};
pub use machine::SessionStateMachine;
pub use marker::{JoinLine, LineMatcher, Marker, UdmuxLine};
pub use sink::{JsonMessageParser, MessageParser, PresenceSink};
pub use state::{GameSession, PendingTeleport, ServerType, SessionRecord, SessionState};
