//! Hublink Ports
//!
//! Port definitions (traits) for the hublink device client.
//! These define the boundaries between the client core and the transport,
//! the device model and the time source.

mod clock;
mod error;
mod events;
mod model;
mod transport;

pub use clock::Clock;
pub use error::{RejectReason, SubmitRejected, TransportError, TransportResult};
pub use events::{
    DeliveryOutcome, EventSink, EventStream, InboundDelivery, PendingDisposition, TransportEvent,
    event_channel,
};
pub use model::DeviceModel;
pub use transport::{Connector, Transport};
