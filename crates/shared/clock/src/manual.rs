use chrono::Utc;
use hublink_core::Timestamp;
use hublink_ports::Clock;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Clock that only advances when explicitly moved
///
/// Cloning shares the underlying time, so a test can keep one handle and
/// give another to a transport.
#[derive(Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    /// Create a manual clock
    ///
    /// # Arguments
    /// * `initial_time` - Optional starting time. If None, uses current wall time.
    pub fn new(initial_time: Option<Timestamp>) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial_time.unwrap_or_else(Utc::now))),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut current = self.current.lock();
        *current = current.checked_add_signed(by).unwrap_or(*current);
    }

    /// Jump to a specific time (may move backwards)
    pub fn set(&self, time: Timestamp) {
        *self.current.lock() = time;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.current.lock()
    }

    fn name(&self) -> &str {
        "ManualClock"
    }
}
