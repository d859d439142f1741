//! Hublink Runner - demo device on the simulated hub
//!
//! - **Config**: JSON configuration with environment override
//! - **Sensors**: random-walk temperature and humidity, button presses
//! - **Command Feed**: the cloud side, correcting LEDs from telemetry
//! - **Device**: the cooperative loop driving the client
//!
//! ## Architecture
//!
//! ```text
//!   SensorSimulator ──readings──▶ Thing ──telemetry──▶ DeviceClient
//!                                   ▲                     │  ▲
//!                          commands │              submit │  │ pump()
//!                                   │                     ▼  │
//!   CommandFeed ──queue_inbound──▶ SimHub ◀──────── SimTransport
//! ```

pub mod clock;
pub mod command_feed;
pub mod config;
pub mod device;
pub mod error;
pub mod sensors;

// Re-export main types
pub use clock::TokioClock;
pub use command_feed::CommandFeed;
pub use config::{
    CONNECTION_STRING_ENV, ExpectedLeds, MAX_SENSOR_STEP, RunnerConfig, SensorConfig,
};
pub use device::{DeviceRunner, RunReport};
pub use error::{ConfigError, Result, RunnerError};
pub use sensors::{SensorReading, SensorSimulator};
