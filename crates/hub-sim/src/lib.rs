//! Hub simulator
//!
//! An in-memory hub plus a [`Transport`](hublink_ports::Transport)
//! implementation that talks to it. Used as the stub transport in tests and
//! as the counterpart of the demo device runner.
//!
//! ```text
//!  DeviceClient ──submit──▶ SimTransport ──flush──▶ SimHub.delivered
//!       ▲                        │
//!       └──── events ────────────┘◀── SimHub mailbox (cloud-to-device)
//! ```
//!
//! Each [`SimHub`] is independent; tests create one per case.

// Cross-cutting concerns
pub mod config;
pub mod model;

// Simulation
pub mod hub;
pub mod transport;

// Re-export main types for convenience
pub use config::SimHubConfig;
pub use hub::SimHub;
pub use model::{AppliedOption, DeliveredMessage, DispositionRecord, QueuedMessage};
pub use transport::{SimConnector, SimTransport};
