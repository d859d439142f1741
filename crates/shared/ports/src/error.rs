use hublink_core::ByteMessage;
use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Option {key} rejected: {reason}")]
    OptionRejected { key: &'static str, reason: String },

    #[error("Inbound messages not supported: {0}")]
    InboundUnsupported(String),

    #[error("Transport closed")]
    Closed,

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Why a transport refused a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Outbound queue is at capacity
    QueueFull,
    /// Transport has been closed
    Closed,
    /// Transport refused the message for another reason
    Refused,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QueueFull => "queue full",
            Self::Closed => "closed",
            Self::Refused => "refused",
        }
    }
}

/// A submission the transport did not take.
///
/// Ownership of the message comes back to the submitter.
#[derive(Error, Debug)]
#[error("Submission rejected: {}", .reason.as_str())]
pub struct SubmitRejected {
    pub message: ByteMessage,
    pub reason: RejectReason,
}

impl SubmitRejected {
    pub fn new(message: ByteMessage, reason: RejectReason) -> Self {
        Self { message, reason }
    }

    pub fn into_message(self) -> ByteMessage {
        self.message
    }
}
