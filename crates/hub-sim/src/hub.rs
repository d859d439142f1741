//! The simulated hub
//!
//! Holds one [`Connection`] per opened transport plus a mailbox of
//! cloud-to-device messages per device. A closed connection is dropped once
//! its inbound deliveries are settled. All state sits behind one lock;
//! [`SimHub`] is a cheap cloneable handle onto it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use hublink_clock::SystemClock;
use hublink_core::{
    ByteMessage, ClientOption, ConfirmationResult, DeviceId, Timestamp, TrackingToken,
};
use hublink_ports::{
    Clock, DeliveryOutcome, EventSink, PendingDisposition, RejectReason, SubmitRejected,
    TransportError,
};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::config::SimHubConfig;
use crate::model::{AppliedOption, DeliveredMessage, DispositionRecord, QueuedMessage};
use crate::transport::SimConnector;

pub(crate) type ConnectionId = u64;

/// A send held by a connection until it is confirmed
struct PendingSend {
    token: TrackingToken,
    message: ByteMessage,
    submitted_at: Timestamp,
    flushed: bool,
    resolution: Option<ConfirmationResult>,
}

/// Hub-side state of one transport
struct Connection {
    device_id: DeviceId,
    events: EventSink,
    sends: VecDeque<PendingSend>,
    min_polling: Duration,
    message_timeout: Option<Duration>,
    last_flush: Option<Timestamp>,
    inbound_enabled: bool,
    awaiting: Vec<(Option<String>, PendingDisposition)>,
    closed: bool,
}

impl Connection {
    fn new(device_id: DeviceId, events: EventSink) -> Self {
        Self {
            device_id,
            events,
            sends: VecDeque::new(),
            min_polling: Duration::ZERO,
            message_timeout: None,
            last_flush: None,
            inbound_enabled: false,
            awaiting: Vec::new(),
            closed: false,
        }
    }

    /// Record the fate of every inbound delivery the client has settled
    fn settle(&mut self, dispositions: &mut Vec<DispositionRecord>) {
        self.awaiting
            .retain_mut(|(message_id, pending)| match pending.poll() {
                DeliveryOutcome::Pending => true,
                outcome => {
                    debug!(
                        "Device {} settled inbound message {:?}: {:?}",
                        self.device_id, message_id, outcome
                    );
                    dispositions.push(DispositionRecord {
                        device_id: self.device_id.clone(),
                        message_id: message_id.take(),
                        outcome,
                    });
                    false
                }
            });
    }

    /// Report resolved sends to the client
    fn emit_resolved(&mut self, now: Timestamp, delivered: &mut Vec<DeliveredMessage>) {
        let mut remaining = VecDeque::with_capacity(self.sends.len());
        for send in self.sends.drain(..) {
            let Some(result) = send.resolution else {
                remaining.push_back(send);
                continue;
            };
            if let Err(e) = self.events.confirm(send.token, result) {
                warn!(
                    "Unable to confirm message {} for device {}: {}",
                    send.token, self.device_id, e
                );
            }
            if result.is_success() {
                delivered.push(DeliveredMessage {
                    device_id: self.device_id.clone(),
                    token: send.token,
                    message: send.message,
                    delivered_at: now,
                });
            }
        }
        self.sends = remaining;
    }
}

pub(crate) struct HubState {
    config: SimHubConfig,
    next_connection: ConnectionId,
    connections: HashMap<ConnectionId, Connection>,
    mailboxes: HashMap<DeviceId, VecDeque<ByteMessage>>,
    delivered: Vec<DeliveredMessage>,
    dispositions: Vec<DispositionRecord>,
    options: Vec<AppliedOption>,
}

impl HubState {
    fn new(config: SimHubConfig) -> Self {
        Self {
            config,
            next_connection: 0,
            connections: HashMap::new(),
            mailboxes: HashMap::new(),
            delivered: Vec::new(),
            dispositions: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Settle every connection and forget closed ones with nothing left to report
    fn settle_all(&mut self) {
        let Self {
            connections,
            dispositions,
            ..
        } = self;
        connections.retain(|id, connection| {
            connection.settle(dispositions);
            let retire = connection.closed && connection.awaiting.is_empty();
            if retire {
                debug!("Pruning closed connection {} for {}", id, connection.device_id);
            }
            !retire
        });
    }
}

/// In-memory hub shared by any number of simulated transports
#[derive(Clone)]
pub struct SimHub {
    state: Arc<Mutex<HubState>>,
    clock: Arc<dyn Clock>,
}

impl SimHub {
    /// Create a hub running on wall-clock time
    pub fn new(config: SimHubConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Create a hub with a custom time source
    pub fn with_clock(config: SimHubConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState::new(config))),
            clock,
        }
    }

    /// Connector producing transports attached to this hub
    pub fn connector(&self) -> SimConnector {
        SimConnector::new(self.clone())
    }

    /// Current configuration
    pub fn config(&self) -> SimHubConfig {
        self.state.lock().config.clone()
    }

    /// Change the configuration; applies to subsequent operations
    pub fn configure(&self, update: impl FnOnce(&mut SimHubConfig)) {
        update(&mut self.state.lock().config);
    }

    /// Queue a cloud-to-device message for `device_id`.
    ///
    /// It is delivered on the next unit of work of a connection for that
    /// device with inbound messages enabled.
    pub fn queue_inbound(&self, device_id: &str, message: ByteMessage) {
        debug!("Queueing {} byte message for device {}", message.len(), device_id);
        self.state
            .lock()
            .mailboxes
            .entry(device_id.to_string())
            .or_default()
            .push_back(message);
    }

    /// Cloud-to-device messages not yet handed to a device
    pub fn mailbox_len(&self, device_id: &str) -> usize {
        self.state
            .lock()
            .mailboxes
            .get(device_id)
            .map_or(0, VecDeque::len)
    }

    /// Resolve every flushed, unresolved send with `result`.
    ///
    /// Confirmations are reported on each connection's next unit of work.
    /// Returns the number of sends resolved.
    pub fn resolve_pending(&self, result: ConfirmationResult) -> usize {
        let mut state = self.state.lock();
        let mut resolved = 0;
        for connection in state.connections.values_mut() {
            for send in connection
                .sends
                .iter_mut()
                .filter(|s| s.flushed && s.resolution.is_none())
            {
                send.resolution = Some(result);
                resolved += 1;
            }
        }
        debug!("Resolved {} pending sends as {}", resolved, result.as_str());
        resolved
    }

    /// Sends accepted by transports and not yet confirmed
    pub fn outbound_queue(&self) -> Vec<QueuedMessage> {
        let state = self.state.lock();
        let mut queued: Vec<_> = state
            .connections
            .values()
            .flat_map(|connection| {
                connection.sends.iter().map(|send| QueuedMessage {
                    device_id: connection.device_id.clone(),
                    token: send.token,
                    message: send.message.clone(),
                    submitted_at: send.submitted_at,
                    flushed: send.flushed,
                })
            })
            .collect();
        queued.sort_by_key(|q| (q.submitted_at, q.token));
        queued
    }

    /// Device-to-cloud messages confirmed as delivered
    pub fn delivered(&self) -> Vec<DeliveredMessage> {
        self.state.lock().delivered.clone()
    }

    /// Delivered messages from position `index` on, for readers keeping a cursor
    pub fn delivered_since(&self, index: usize) -> Vec<DeliveredMessage> {
        self.state
            .lock()
            .delivered
            .get(index..)
            .map(<[DeliveredMessage]>::to_vec)
            .unwrap_or_default()
    }

    /// Fates of cloud-to-device messages, in settlement order
    pub fn dispositions(&self) -> Vec<DispositionRecord> {
        let mut state = self.state.lock();
        state.settle_all();
        state.dispositions.clone()
    }

    /// Options applied by transports, in order
    pub fn options_applied(&self) -> Vec<AppliedOption> {
        self.state.lock().options.clone()
    }

    /// Transports opened and not yet closed
    pub fn open_transports(&self) -> usize {
        self.state
            .lock()
            .connections
            .values()
            .filter(|c| !c.closed)
            .count()
    }

    /// True if `device_id` has no open transport
    pub fn is_closed(&self, device_id: &str) -> bool {
        !self
            .state
            .lock()
            .connections
            .values()
            .any(|c| !c.closed && c.device_id == device_id)
    }

    /// Connections the hub still holds state for, open or awaiting settlement
    pub fn retained_connections(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Transports ever opened
    pub fn connections_made(&self) -> usize {
        self.state.lock().next_connection as usize
    }

    // Transport-facing operations

    pub(crate) fn open(
        &self,
        device_id: &str,
        events: EventSink,
    ) -> Result<ConnectionId, TransportError> {
        let mut state = self.state.lock();
        if !state.config.accept_connections {
            warn!("Hub refused connection for device {}", device_id);
            return Err(TransportError::Connection(format!(
                "hub refused connection for device {}",
                device_id
            )));
        }

        let id = state.next_connection;
        state.next_connection += 1;
        state
            .connections
            .insert(id, Connection::new(device_id.to_string(), events));

        info!("Device {} connected (connection {})", device_id, id);
        Ok(id)
    }

    pub(crate) fn set_option(
        &self,
        id: ConnectionId,
        option: ClientOption,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let HubState {
            config,
            connections,
            options,
            ..
        } = &mut *state;

        let connection = open_connection(connections, id)?;
        if config.rejected_options.iter().any(|k| k == option.key()) {
            return Err(TransportError::OptionRejected {
                key: option.key(),
                reason: "refused by hub".to_string(),
            });
        }

        match option {
            ClientOption::MinimumPollingTime(interval) => connection.min_polling = interval,
            ClientOption::MessageTimeout(timeout) => connection.message_timeout = Some(timeout),
        }
        options.push(AppliedOption {
            device_id: connection.device_id.clone(),
            key: option.key(),
            value: option.wire_value(),
        });
        Ok(())
    }

    pub(crate) fn enable_inbound(&self, id: ConnectionId) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        let supports_inbound = state.config.supports_inbound;
        let connection = open_connection(&mut state.connections, id)?;
        if !supports_inbound {
            return Err(TransportError::InboundUnsupported(
                "hub has cloud-to-device messaging disabled".to_string(),
            ));
        }
        connection.inbound_enabled = true;
        Ok(())
    }

    pub(crate) fn submit(
        &self,
        id: ConnectionId,
        message: ByteMessage,
        token: TrackingToken,
    ) -> Result<(), SubmitRejected> {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let HubState {
            config,
            connections,
            ..
        } = &mut *state;

        let Some(connection) = connections.get_mut(&id).filter(|c| !c.closed) else {
            return Err(SubmitRejected::new(message, RejectReason::Closed));
        };
        if config.refuse_submissions {
            return Err(SubmitRejected::new(message, RejectReason::Refused));
        }
        if connection.sends.len() >= config.queue_capacity {
            return Err(SubmitRejected::new(message, RejectReason::QueueFull));
        }

        connection.sends.push_back(PendingSend {
            token,
            message,
            submitted_at: now,
            flushed: false,
            resolution: None,
        });
        Ok(())
    }

    pub(crate) fn do_work(&self, id: ConnectionId) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let HubState {
            config,
            connections,
            mailboxes,
            delivered,
            dispositions,
            ..
        } = &mut *state;

        let Some(connection) = connections.get_mut(&id).filter(|c| !c.closed) else {
            return;
        };

        connection.settle(dispositions);

        // Outbound batches go out at most once per polling interval
        let due = connection
            .last_flush
            .is_none_or(|last| elapsed(last, now) >= connection.min_polling);
        if due && connection.sends.iter().any(|s| !s.flushed) {
            let mut batch = 0;
            for send in connection.sends.iter_mut().filter(|s| !s.flushed) {
                send.flushed = true;
                send.resolution = config.auto_resolve;
                batch += 1;
            }
            connection.last_flush = Some(now);
            debug!(
                "Device {} flushed {} messages",
                connection.device_id, batch
            );
        }

        if let Some(timeout) = connection.message_timeout {
            for send in connection
                .sends
                .iter_mut()
                .filter(|s| s.resolution.is_none() && elapsed(s.submitted_at, now) >= timeout)
            {
                debug!(
                    "Message {} for device {} timed out",
                    send.token, connection.device_id
                );
                send.resolution = Some(ConfirmationResult::MessageTimeout);
            }
        }

        connection.emit_resolved(now, delivered);

        if connection.inbound_enabled && !connection.events.is_closed() {
            if let Some(mailbox) = mailboxes.get_mut(&connection.device_id) {
                while let Some(message) = mailbox.pop_front() {
                    let message_id = message.message_id().map(str::to_string);
                    match connection.events.deliver(message) {
                        Ok(pending) => connection.awaiting.push((message_id, pending)),
                        Err(e) => {
                            warn!(
                                "Lost inbound message for device {}: {}",
                                connection.device_id, e
                            );
                            break;
                        }
                    }
                }
            }
        }
    }

    pub(crate) fn close(&self, id: ConnectionId) {
        let now = self.clock.now();
        let mut state = self.state.lock();
        let HubState {
            connections,
            delivered,
            dispositions,
            ..
        } = &mut *state;

        let Some(connection) = connections.get_mut(&id).filter(|c| !c.closed) else {
            return;
        };

        connection.settle(dispositions);
        for send in connection.sends.iter_mut() {
            if send.resolution.is_none() {
                send.resolution = Some(ConfirmationResult::BecauseDestroy);
            }
        }
        connection.emit_resolved(now, delivered);
        connection.closed = true;

        info!("Device {} disconnected (connection {})", connection.device_id, id);

        // Kept only while inbound deliveries still await a verdict
        if connection.awaiting.is_empty() {
            connections.remove(&id);
        }
    }
}

fn open_connection(
    connections: &mut HashMap<ConnectionId, Connection>,
    id: ConnectionId,
) -> Result<&mut Connection, TransportError> {
    connections
        .get_mut(&id)
        .filter(|c| !c.closed)
        .ok_or(TransportError::Closed)
}

/// Time from `since` to `now`; zero if the clock moved backwards
fn elapsed(since: Timestamp, now: Timestamp) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

impl Default for SimHub {
    fn default() -> Self {
        Self::new(SimHubConfig::default())
    }
}

impl std::fmt::Debug for SimHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimHub")
            .field("clock", &self.clock.name())
            .field("open_transports", &self.open_transports())
            .finish()
    }
}
