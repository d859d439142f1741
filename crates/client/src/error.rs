//! Error types for the client crate

use hublink_core::{ConnectionStringError, MessageError, TrackingToken};
use hublink_ports::{RejectReason, TransportError};
use thiserror::Error;

/// Errors returned by [`DeviceClient`](crate::DeviceClient) operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Invalid connection string: {0}")]
    ConnectionString(#[from] ConnectionStringError),

    #[error("Connection setup failed: {0}")]
    Setup(TransportError),

    #[error("Unable to create message: {0}")]
    Message(#[from] MessageError),

    #[error("Transport rejected message {token}: {}", .reason.as_str())]
    Submit {
        token: TrackingToken,
        reason: RejectReason,
    },

    #[error("A device model is already registered")]
    ModelAlreadyRegistered,

    #[error("Transport error: {0}")]
    Transport(TransportError),
}

impl ClientError {
    /// True for failures that leave no usable connection behind
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::ConnectionString(_) | Self::Setup(_))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
