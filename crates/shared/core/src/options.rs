use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport options a client may set after connecting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientOption {
    /// Lower bound between two outbound batches (whole seconds on the wire)
    MinimumPollingTime(Duration),
    /// How long a send may stay unacknowledged before it times out
    MessageTimeout(Duration),
}

impl ClientOption {
    /// Polling interval applied to every new connection
    pub const DEFAULT_MINIMUM_POLLING_TIME: Duration = Duration::from_secs(2);

    /// Option key understood by the transport
    pub fn key(&self) -> &'static str {
        match self {
            Self::MinimumPollingTime(_) => "MinimumPollingTime",
            Self::MessageTimeout(_) => "messageTimeout",
        }
    }

    /// Value as the transport expects it: seconds for the polling time,
    /// milliseconds for the message timeout
    pub fn wire_value(&self) -> u64 {
        match self {
            Self::MinimumPollingTime(interval) => interval.as_secs(),
            Self::MessageTimeout(timeout) => {
                u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
            }
        }
    }

    pub fn default_polling() -> Self {
        Self::MinimumPollingTime(Self::DEFAULT_MINIMUM_POLLING_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_values() {
        let polling = ClientOption::default_polling();
        assert_eq!(polling.key(), "MinimumPollingTime");
        assert_eq!(polling.wire_value(), 2);

        let timeout = ClientOption::MessageTimeout(Duration::from_millis(1500));
        assert_eq!(timeout.key(), "messageTimeout");
        assert_eq!(timeout.wire_value(), 1500);
    }
    #[test]
    fn test_huge_timeout_saturates() {
        let timeout = ClientOption::MessageTimeout(Duration::MAX);
        assert_eq!(timeout.wire_value(), u64::MAX);
    }
}
