use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Longest `details`/`state` string accepted from an experience.
pub const MAX_FIELD_LEN: usize = 128;

/// Data of a `SetRichPresence` message.
///
/// Every field is optional: an absent field leaves the current presence
/// untouched. An empty string resets a text field to its default, and a
/// zero timestamp clears the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichPresence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_image: Option<RichPresenceImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large_image: Option<RichPresenceImage>,
}

/// Image override for one of the presence image slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichPresenceImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_text: Option<String>,
    /// Removes the image entirely.
    #[serde(default, skip_serializing_if = "is_false")]
    pub clear: bool,
    /// Restores the default image.
    #[serde(default, skip_serializing_if = "is_false")]
    pub reset: bool,
}

impl RichPresence {
    /// Checks the text fields against [`MAX_FIELD_LEN`].
    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_len("details", self.details.as_deref())?;
        check_len("state", self.state.as_deref())?;
        for image in [&self.small_image, &self.large_image].into_iter().flatten() {
            check_len("hoverText", image.hover_text.as_deref())?;
        }
        Ok(())
    }
}

fn check_len(field: &'static str, value: Option<&str>) -> Result<(), ProtocolError> {
    let len = value.map_or(0, |v| v.chars().count());
    if len > MAX_FIELD_LEN {
        return Err(ProtocolError::FieldTooLong {
            field,
            len,
            max: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

fn is_false(v: &bool) -> bool {
    !*v
}
