//! Byte-oriented message exchanged with the hub
//!
//! A [`ByteMessage`] owns its payload. Outbound, the creator hands it to the
//! transport by value; inbound, the transport lends it to the dispatch path
//! for the duration of one call.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MessageError, WrapError};

/// Largest payload the hub accepts for a single device-to-cloud message
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Payload of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    /// Raw bytes, not necessarily UTF-8 or NUL-terminated
    Bytes(Vec<u8>),
    /// Text payload
    String(String),
}

impl MessageContent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::String(_) => "string",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(bytes) => bytes.len(),
            Self::String(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One unit of data sent to or received from the hub
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteMessage {
    content: MessageContent,
    message_id: Option<String>,
    correlation_id: Option<String>,
    properties: BTreeMap<String, String>,
}

impl ByteMessage {
    /// Copy `bytes` into a new message.
    ///
    /// The copy uses a fallible allocation so an out-of-memory condition is
    /// reported instead of aborting.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        check_size(bytes.len())?;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes.len())
            .map_err(|_| MessageError::Allocation(bytes.len()))?;
        buffer.extend_from_slice(bytes);

        Ok(Self::with_content(MessageContent::Bytes(buffer)))
    }

    /// Take ownership of `buffer`.
    ///
    /// On failure the buffer is returned inside the [`WrapError`].
    pub fn from_vec(buffer: Vec<u8>) -> Result<Self, WrapError> {
        if let Err(error) = check_size(buffer.len()) {
            return Err(WrapError::new(error, buffer));
        }
        Ok(Self::with_content(MessageContent::Bytes(buffer)))
    }

    /// Create a text message
    pub fn from_text(text: impl Into<String>) -> Result<Self, MessageError> {
        let text = text.into();
        check_size(text.len())?;
        Ok(Self::with_content(MessageContent::String(text)))
    }

    fn with_content(content: MessageContent) -> Self {
        Self {
            content,
            message_id: None,
            correlation_id: None,
            properties: BTreeMap::new(),
        }
    }

    /// Set the message id
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Assign a random message id
    pub fn with_generated_id(self) -> Self {
        self.with_message_id(Uuid::new_v4().to_string())
    }

    /// Set the correlation id
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Add an application property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Borrow the payload as bytes.
    ///
    /// Fails for text messages, which only expose [`as_text`](Self::as_text).
    pub fn byte_array(&self) -> Result<&[u8], MessageError> {
        match &self.content {
            MessageContent::Bytes(bytes) => Ok(bytes),
            other => Err(MessageError::ContentType {
                expected: "bytes",
                actual: other.as_str(),
            }),
        }
    }

    /// Borrow the payload as text
    pub fn as_text(&self) -> Result<&str, MessageError> {
        match &self.content {
            MessageContent::String(text) => Ok(text),
            other => Err(MessageError::ContentType {
                expected: "string",
                actual: other.as_str(),
            }),
        }
    }

    pub fn content(&self) -> &MessageContent {
        &self.content
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Release the payload, dropping the metadata
    pub fn into_content(self) -> MessageContent {
        self.content
    }
}

// Payloads can be large and may carry sensor data; show the shape only.
impl fmt::Debug for ByteMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteMessage")
            .field("content", &self.content.as_str())
            .field("len", &self.len())
            .field("message_id", &self.message_id)
            .field("correlation_id", &self.correlation_id)
            .field("properties", &self.properties.len())
            .finish()
    }
}

fn check_size(size: usize) -> Result<(), MessageError> {
    if size > MAX_MESSAGE_SIZE {
        return Err(MessageError::TooLarge {
            size,
            limit: MAX_MESSAGE_SIZE,
        });
    }
    Ok(())
}
