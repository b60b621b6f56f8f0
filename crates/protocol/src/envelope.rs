use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::rich_presence::RichPresence;

const SET_RICH_PRESENCE: &str = "SetRichPresence";

/// Known message commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetRichPresence,
    Unknown(String),
}

/// Envelope for every in-game message.
///
/// The `data` field uses `serde_json::value::RawValue` to defer
/// deserialization until the command is known, so a command this crate has
/// never heard of still decodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<serde_json::value::RawValue>>,
}

impl Message {
    /// Classifies the command string.
    pub fn kind(&self) -> Command {
        match self.command.as_str() {
            SET_RICH_PRESENCE => Command::SetRichPresence,
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Deserializes the data into the given type.
    pub fn parse_data<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Returns the validated rich presence data of a `SetRichPresence` message.
    ///
    /// `Ok(None)` for any other command, or when the data field is absent.
    pub fn rich_presence(&self) -> Result<Option<RichPresence>, ProtocolError> {
        if self.kind() != Command::SetRichPresence {
            return Ok(None);
        }
        let Some(presence) = self.parse_data::<RichPresence>()? else {
            return Ok(None);
        };
        presence.validate()?;
        Ok(Some(presence))
    }
}

/// Decodes the payload that follows the message marker on a log line.
pub fn parse_message(payload: &str) -> Result<Message, ProtocolError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(payload)?)
}
