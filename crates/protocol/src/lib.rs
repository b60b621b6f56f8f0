//! Message types for the custom in-game protocol.
//!
//! Experiences can write a JSON document to the client log behind the
//! `[BloxstrapRPC]` marker. This crate decodes that payload; deciding what
//! to do with it is left to the presence layer.

pub mod envelope;
pub mod error;
pub mod rich_presence;

pub use envelope::{Command, Message, parse_message};
pub use error::ProtocolError;
pub use rich_presence::{MAX_FIELD_LEN, RichPresence, RichPresenceImage};
