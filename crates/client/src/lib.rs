//! Hublink Client
//!
//! Device-side messaging core. A [`DeviceClient`] owns one connection to the
//! hub and exposes:
//! - a send path with per-message delivery confirmation
//! - a dispatch path that routes inbound messages to a [`DeviceModel`]
//! - a cooperative work pump that drives all I/O
//!
//! ## Data flow
//!
//! ```text
//!   application ──send──▶ DeviceClient ──submit──▶ Transport ──▶ hub
//!                              ▲                      │
//!                              │   TransportEvent     │ do_work()
//!                              └──────────────────────┘
//!                     pump(): confirmations ─▶ callbacks
//!                             inbound       ─▶ DeviceModel ─▶ Disposition
//! ```
//!
//! Nothing happens in the background: confirmations and inbound messages
//! are only processed inside [`DeviceClient::pump`], on the calling thread.
//!
//! ## Usage
//!
//! ```ignore
//! let mut client = DeviceClient::create(connection_string, &connector)?;
//! client.register_model(thing.clone())?;
//!
//! client.send_event_owned(telemetry_json.into_bytes())?;
//! loop {
//!     client.pump();
//!     sleep(Duration::from_millis(100));
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod pump;
pub mod send;

// Re-export commonly used types
pub use client::DeviceClient;
pub use dispatch::dispatch;
pub use error::{ClientError, Result};
pub use pump::WorkSummary;
pub use send::ConfirmationCallback;

pub use hublink_core::{
    ByteMessage, ClientOption, Confirmation, ConfirmationResult, Disposition,
    ExecuteCommandResult, TrackingToken,
};
pub use hublink_ports::{Connector, DeviceModel, Transport};
