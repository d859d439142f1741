//! Hublink Thing
//!
//! A small device with two LEDs, a temperature/humidity sensor and a button.
//!
//! - [`Thing`]: shared device state; implements
//!   [`DeviceModel`](hublink_ports::DeviceModel) so it can be bound to a
//!   client
//! - [`Telemetry`]: the readings reported to the hub, as JSON
//! - [`Action`]: the commands the hub can send, as JSON

pub mod command;
pub mod error;
pub mod telemetry;
pub mod thing;

pub use command::{Action, LedParameters};
pub use error::{Result, ThingError};
pub use telemetry::Telemetry;
pub use thing::{LED_COUNT, Thing};
