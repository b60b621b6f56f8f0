//! Collaborator seams of the state machine.
//!
//! The machine never talks to a presence client or a payload decoder
//! directly; the application provides implementations of these traits.

use bloxpresence_protocol::{Message, ProtocolError};

use crate::error::PresenceError;
use crate::state::GameSession;

/// Receives session events.
///
/// Called synchronously from `handle_line`; a slow implementation delays
/// processing of the next log line.
pub trait PresenceSink {
    /// The server confirmed a join.
    fn session_started(&mut self, session: &GameSession) -> Result<(), PresenceError>;

    /// The client left the server. Presence should be cleared.
    fn session_ended(&mut self, session: &GameSession) -> Result<(), PresenceError>;

    /// An experience sent a custom message while in game.
    fn apply_message(
        &mut self,
        session: &GameSession,
        message: &Message,
    ) -> Result<(), PresenceError>;
}

impl<T: PresenceSink + ?Sized> PresenceSink for Box<T> {
    fn session_started(&mut self, session: &GameSession) -> Result<(), PresenceError> {
        (**self).session_started(session)
    }

    fn session_ended(&mut self, session: &GameSession) -> Result<(), PresenceError> {
        (**self).session_ended(session)
    }

    fn apply_message(
        &mut self,
        session: &GameSession,
        message: &Message,
    ) -> Result<(), PresenceError> {
        (**self).apply_message(session, message)
    }
}

/// Decodes the payload of a custom message line.
pub trait MessageParser {
    fn parse(&self, payload: &str) -> Result<Message, ProtocolError>;
}

/// Decodes payloads as JSON [`Message`] envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMessageParser;

impl MessageParser for JsonMessageParser {
    fn parse(&self, payload: &str) -> Result<Message, ProtocolError> {
        bloxpresence_protocol::parse_message(payload)
    }
}
