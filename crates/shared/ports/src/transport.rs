use hublink_core::{ByteMessage, ClientOption, ConnectionString, TrackingToken};

use crate::error::{SubmitRejected, TransportError};
use crate::events::EventSink;

/// Port for the store-and-forward transport behind a device client
///
/// All methods return promptly. Outcomes of submitted messages and inbound
/// messages are reported as events on the [`EventSink`] handed over at
/// connect time, and only from within [`do_work`](Transport::do_work) or
/// [`close`](Transport::close).
pub trait Transport {
    /// Apply a configuration option
    fn set_option(&mut self, option: ClientOption) -> Result<(), TransportError>;

    /// Start delivering cloud-to-device messages
    fn enable_inbound(&mut self) -> Result<(), TransportError>;

    /// Queue a message for delivery.
    ///
    /// On success the transport owns the message until it reports a
    /// confirmation for `token`. On failure the message is handed back.
    fn submit(&mut self, message: ByteMessage, token: TrackingToken) -> Result<(), SubmitRejected>;

    /// Perform one slice of network work
    fn do_work(&mut self);

    /// Release all resources; pending sends are confirmed as destroyed
    fn close(&mut self);

    /// Get the transport's name for logging
    fn name(&self) -> &str {
        "Transport"
    }
}

/// Port for creating transports; one implementation per protocol
pub trait Connector {
    type Transport: Transport;

    /// Open a transport for the given device
    fn connect(
        &self,
        connection_string: &ConnectionString,
        events: EventSink,
    ) -> Result<Self::Transport, TransportError>;
}
