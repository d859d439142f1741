use thiserror::Error;

/// Errors raised while building or reading a [`ByteMessage`](crate::ByteMessage)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Message of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Message content is {actual}, expected {expected}")]
    ContentType {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Unable to allocate {0} bytes for message")]
    Allocation(usize),
}

/// Failure to wrap an owned buffer; hands the buffer back to the caller.
#[derive(Error, Debug)]
#[error("{error}")]
pub struct WrapError {
    pub error: MessageError,
    pub buffer: Vec<u8>,
}

impl WrapError {
    pub fn new(error: MessageError, buffer: Vec<u8>) -> Self {
        Self { error, buffer }
    }

    /// Take the buffer back, discarding the error
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }
}

/// Connection string parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStringError {
    #[error("Connection string is empty")]
    Empty,

    #[error("Malformed connection string segment: {0}")]
    MalformedSegment(String),

    #[error("Connection string is missing {0}")]
    MissingKey(&'static str),

    #[error("Connection string has no credential (SharedAccessKey, SharedAccessSignature or x509)")]
    MissingCredential,
}
