use thiserror::Error;

/// Errors raised by block payloads and player input
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("Unknown block type: {0}")]
    UnknownType(String),

    #[error("{0} is a required field")]
    MissingField(String),

    #[error("Invalid {field}: {message}")]
    InvalidField { field: String, message: String },

    /// Stored payload or player data does not match the block's shape
    #[error("Malformed block data: {0}")]
    Payload(String),
}

impl BlockError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for BlockError {
    fn from(err: serde_json::Error) -> Self {
        Self::Payload(err.to_string())
    }
}
