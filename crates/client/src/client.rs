//! Connection handle
//!
//! A [`DeviceClient`] is one logical connection to the hub. It is an owned
//! value: there is no process-wide slot, and several clients (one per test,
//! or one per device identity) can live side by side.

use hublink_core::{ClientOption, Confirmation, ConfirmationResult, ConnectionString};
use hublink_ports::{Connector, DeviceModel, EventStream, Transport, event_channel};
use log::{debug, error, info, warn};

use crate::error::{ClientError, Result};
use crate::send::PendingSends;

/// Device-side connection to the hub
///
/// Not thread-safe: every operation takes `&mut self`, and
/// callbacks only run inside [`pump`](DeviceClient::pump) or
/// [`destroy`](DeviceClient::destroy) on the caller's thread.
pub struct DeviceClient<T: Transport> {
    /// Parsed connection string (credentials redacted in logs)
    pub(crate) connection: ConnectionString,
    /// Transport performing the actual I/O
    pub(crate) transport: T,
    /// Events reported by the transport, drained by the pump
    pub(crate) events: EventStream,
    /// Sends awaiting confirmation
    pub(crate) sends: PendingSends,
    /// Model receiving inbound messages, bound once
    pub(crate) model: Option<Box<dyn DeviceModel>>,
    /// Set once the transport has been closed
    closed: bool,
}

impl<T: Transport> DeviceClient<T> {
    /// Create a connection from a connection string.
    ///
    /// Applies a 2 second minimum polling time; failing to apply it is
    /// logged and otherwise ignored. The client never retries a failed
    /// connection, that decision belongs to the caller.
    pub fn create<C>(connection_string: &str, connector: &C) -> Result<Self>
    where
        C: Connector<Transport = T>,
    {
        let connection = ConnectionString::parse(connection_string).map_err(|e| {
            error!("Invalid connection string: {}", e);
            ClientError::ConnectionString(e)
        })?;

        let (sink, events) = event_channel();
        let transport = connector.connect(&connection, sink).map_err(|e| {
            error!(
                "Failed to create client for device {}: {}",
                connection.device_id(),
                e
            );
            ClientError::Setup(e)
        })?;

        let mut client = Self {
            connection,
            transport,
            events,
            sends: PendingSends::new(),
            model: None,
            closed: false,
        };

        let polling = ClientOption::default_polling();
        if let Err(e) = client.transport.set_option(polling) {
            warn!("Failure to set option \"{}\": {}", polling.key(), e);
        }

        info!(
            "Device {} connected to {} via {}",
            client.connection.device_id(),
            client.connection.host_name(),
            client.transport.name()
        );

        Ok(client)
    }

    /// Apply a transport option
    pub fn set_option(&mut self, option: ClientOption) -> Result<()> {
        self.transport.set_option(option).map_err(|e| {
            warn!("Failure to set option \"{}\": {}", option.key(), e);
            ClientError::Transport(e)
        })?;
        debug!("Option {} set to {}", option.key(), option.wire_value());
        Ok(())
    }

    /// Close the connection.
    ///
    /// Every send still awaiting confirmation is resolved with
    /// [`ConfirmationResult::BecauseDestroy`]; its callback fires here and
    /// the confirmations are returned. Inbound messages still queued are
    /// abandoned without reaching the model.
    pub fn destroy(mut self) -> Vec<Confirmation> {
        info!("Destroying client for device {}", self.device_id());

        self.transport.close();
        self.closed = true;

        let mut summary = self.drain_events(false);

        // Anything the transport did not resolve on close is resolved here,
        // so each callback still fires exactly once.
        for token in self.sends.pending_tokens() {
            let confirmation = Confirmation::new(token, ConfirmationResult::BecauseDestroy);
            self.sends.resolve(confirmation);
            summary.confirmations.push(confirmation);
        }

        summary.confirmations
    }

    /// Device identity from the connection string
    pub fn device_id(&self) -> &str {
        self.connection.device_id()
    }

    /// Hub host name from the connection string
    pub fn host_name(&self) -> &str {
        self.connection.host_name()
    }

    /// Number of sends awaiting confirmation
    pub fn pending_sends(&self) -> usize {
        self.sends.len()
    }

    /// True once a device model is bound
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Borrow the transport (diagnostics)
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Drop for DeviceClient<T> {
    fn drop(&mut self) {
        if !self.closed {
            // Dropped without destroy(): release the transport, but pending
            // callbacks are discarded rather than fired from a destructor.
            if !self.sends.is_empty() {
                warn!(
                    "Client for device {} dropped without destroy; {} confirmation callbacks will not fire",
                    self.connection.device_id(),
                    self.sends.len()
                );
            } else {
                debug!(
                    "Client for device {} dropped without destroy",
                    self.connection.device_id()
                );
            }
            self.transport.close();
            self.closed = true;
        }
    }
}
