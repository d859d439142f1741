use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThingError {
    #[error("Command is not valid UTF-8")]
    NotUtf8,

    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("No LED with id {0}")]
    UnknownLed(i32),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ThingError {
    fn from(err: serde_json::Error) -> Self {
        ThingError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ThingError>;
