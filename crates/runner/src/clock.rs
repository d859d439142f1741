use chrono::{TimeDelta, Utc};
use hublink_core::Timestamp;
use hublink_ports::Clock;
use tokio::time::Instant;

/// Wall time that advances with the tokio clock
///
/// Follows tokio's paused time in tests, so the hub's polling interval and
/// message timeouts line up with the runner's intervals.
pub struct TokioClock {
    origin: Timestamp,
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: Utc::now(),
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let elapsed = TimeDelta::from_std(self.start.elapsed()).unwrap_or(TimeDelta::MAX);
        self.origin
            .checked_add_signed(elapsed)
            .unwrap_or(self.origin)
    }

    fn name(&self) -> &str {
        "TokioClock"
    }
}
