use chrono::Utc;
use hublink_core::Timestamp;
use hublink_ports::Clock;

/// Real system clock for production use
///
/// This simply returns the current wall-clock time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
