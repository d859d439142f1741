use serde::{Deserialize, Serialize};

/// Result reported by a device model after executing an inbound command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecuteCommandResult {
    /// Command understood and executed
    Success,
    /// Command understood but refused; redelivery will not help
    Rejected,
    /// Command could not be executed this time
    Error,
}

/// Fate of an inbound message, reported back to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Complete the message
    Accepted,
    /// Dead-letter the message
    Rejected,
    /// Release the message for redelivery
    Abandoned,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Abandoned => "abandoned",
        }
    }
}

impl From<ExecuteCommandResult> for Disposition {
    fn from(result: ExecuteCommandResult) -> Self {
        match result {
            ExecuteCommandResult::Success => Disposition::Accepted,
            ExecuteCommandResult::Rejected => Disposition::Rejected,
            ExecuteCommandResult::Error => Disposition::Abandoned,
        }
    }
}
