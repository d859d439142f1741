use serde::{Deserialize, Serialize};

use crate::token::TrackingToken;

/// Outcome of an outbound send as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationResult {
    /// The hub acknowledged the message
    Ok,
    /// The connection was destroyed before the message was acknowledged
    BecauseDestroy,
    /// The message was not acknowledged within the configured timeout
    MessageTimeout,
    /// The transport gave up on the message
    Error,
}

impl ConfirmationResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::BecauseDestroy => "because_destroy",
            Self::MessageTimeout => "message_timeout",
            Self::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A resolved send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub token: TrackingToken,
    pub result: ConfirmationResult,
}

impl Confirmation {
    pub fn new(token: TrackingToken, result: ConfirmationResult) -> Self {
        Self { token, result }
    }
}
