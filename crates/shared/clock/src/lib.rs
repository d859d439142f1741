//! Hublink Clock Infrastructure
//!
//! Time sources for transports:
//!
//! - [`SystemClock`]: wall-clock time for real devices
//! - [`ManualClock`]: time that only moves when told to, for tests and
//!   simulations
//!
//! ## Usage
//!
//! ```
//! use hublink_clock::{Clock, ManualClock};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new(None);
//! let before = clock.now();
//! clock.advance(Duration::from_secs(2));
//! assert_eq!((clock.now() - before).num_seconds(), 2);
//! ```

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use hublink_ports::Clock;
