//! Error types for message decoding.

/// Errors produced while decoding an in-game message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message payload")]
    Empty,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("field {field} is {len} characters long (max {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
