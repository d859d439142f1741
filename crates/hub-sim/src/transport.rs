use hublink_core::{ByteMessage, ClientOption, ConnectionString, DeviceId, TrackingToken};
use hublink_ports::{Connector, EventSink, SubmitRejected, Transport, TransportError};
use log::trace;

use crate::hub::{ConnectionId, SimHub};

/// Opens [`SimTransport`]s against a [`SimHub`]
#[derive(Debug, Clone)]
pub struct SimConnector {
    hub: SimHub,
}

impl SimConnector {
    pub fn new(hub: SimHub) -> Self {
        Self { hub }
    }

    pub fn hub(&self) -> &SimHub {
        &self.hub
    }
}

impl Connector for SimConnector {
    type Transport = SimTransport;

    fn connect(
        &self,
        connection: &ConnectionString,
        events: EventSink,
    ) -> Result<SimTransport, TransportError> {
        let device_id = connection.device_id().to_string();
        let id = self.hub.open(&device_id, events)?;
        Ok(SimTransport {
            hub: self.hub.clone(),
            id,
            device_id,
        })
    }
}

/// One device connection to a [`SimHub`]
#[derive(Debug)]
pub struct SimTransport {
    hub: SimHub,
    id: ConnectionId,
    device_id: DeviceId,
}

impl SimTransport {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

impl Transport for SimTransport {
    fn set_option(&mut self, option: ClientOption) -> Result<(), TransportError> {
        self.hub.set_option(self.id, option)
    }

    fn enable_inbound(&mut self) -> Result<(), TransportError> {
        self.hub.enable_inbound(self.id)
    }

    fn submit(&mut self, message: ByteMessage, token: TrackingToken) -> Result<(), SubmitRejected> {
        self.hub.submit(self.id, message, token)
    }

    fn do_work(&mut self) {
        trace!("SimTransport doing work for {}", self.device_id);
        self.hub.do_work(self.id);
    }

    fn close(&mut self) {
        self.hub.close(self.id);
    }

    fn name(&self) -> &str {
        "SimTransport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimHubConfig;
    use hublink_clock::ManualClock;
    use hublink_core::{ConfirmationResult, Disposition};
    use hublink_ports::{DeliveryOutcome, RejectReason, TransportEvent, event_channel};
    use std::sync::Arc;
    use std::time::Duration;

    fn connection() -> ConnectionString {
        ConnectionString::parse("HostName=h;DeviceId=d;SharedAccessKey=k").unwrap()
    }

    fn setup(config: SimHubConfig) -> (SimHub, ManualClock) {
        let clock = ManualClock::new(None);
        let hub = SimHub::with_clock(config, Arc::new(clock.clone()));
        (hub, clock)
    }

    fn message(bytes: &[u8]) -> ByteMessage {
        ByteMessage::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_refused_connection() {
        let (hub, _) = setup(SimHubConfig {
            accept_connections: false,
            ..Default::default()
        });
        let (sink, _events) = event_channel();

        let result = hub.connector().connect(&connection(), sink);

        assert!(matches!(result, Err(TransportError::Connection(_))));
        assert_eq!(hub.open_transports(), 0);
    }

    #[test]
    fn test_submit_flush_and_confirm() {
        let (hub, _) = setup(SimHubConfig::default());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();

        transport.submit(message(b"temp=21"), TrackingToken::new(0)).unwrap();
        assert_eq!(hub.outbound_queue().len(), 1);
        assert!(events.try_next().is_none());

        transport.do_work();

        match events.try_next() {
            Some(TransportEvent::Confirmation(c)) => {
                assert_eq!(c.token, TrackingToken::new(0));
                assert_eq!(c.result, ConfirmationResult::Ok);
            }
            other => panic!("Expected confirmation, got {:?}", other),
        }
        assert!(hub.outbound_queue().is_empty());
        let delivered = hub.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].device_id, "d");
        assert_eq!(delivered[0].message.byte_array().unwrap(), b"temp=21");

        assert_eq!(hub.delivered_since(0).len(), 1);
        assert!(hub.delivered_since(1).is_empty());
        assert!(hub.delivered_since(5).is_empty());
    }

    #[test]
    fn test_queue_capacity() {
        let (hub, _) = setup(SimHubConfig::default().with_queue_capacity(1));
        let (sink, _events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();

        transport.submit(message(b"a"), TrackingToken::new(0)).unwrap();
        let rejected = transport
            .submit(message(b"b"), TrackingToken::new(1))
            .unwrap_err();

        assert_eq!(rejected.reason, RejectReason::QueueFull);
        assert_eq!(rejected.into_message().byte_array().unwrap(), b"b");
    }

    #[test]
    fn test_polling_interval_gates_flush() {
        let (hub, clock) = setup(SimHubConfig::default());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();
        transport
            .set_option(ClientOption::MinimumPollingTime(Duration::from_secs(2)))
            .unwrap();

        transport.submit(message(b"a"), TrackingToken::new(0)).unwrap();
        transport.do_work();
        assert!(events.try_next().is_some());

        transport.submit(message(b"b"), TrackingToken::new(1)).unwrap();
        clock.advance(Duration::from_secs(1));
        transport.do_work();
        assert!(events.try_next().is_none());

        clock.advance(Duration::from_secs(1));
        transport.do_work();
        assert!(events.try_next().is_some());
    }

    #[test]
    fn test_message_timeout() {
        let (hub, clock) = setup(SimHubConfig::manual_resolution());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();
        transport
            .set_option(ClientOption::MessageTimeout(Duration::from_millis(500)))
            .unwrap();

        transport.submit(message(b"a"), TrackingToken::new(7)).unwrap();
        transport.do_work();
        assert!(events.try_next().is_none());

        clock.advance(Duration::from_millis(500));
        transport.do_work();
        match events.try_next() {
            Some(TransportEvent::Confirmation(c)) => {
                assert_eq!(c.token, TrackingToken::new(7));
                assert_eq!(c.result, ConfirmationResult::MessageTimeout);
            }
            other => panic!("Expected timeout, got {:?}", other),
        }
        assert!(hub.delivered().is_empty());
    }

    #[test]
    fn test_rejected_option_is_not_recorded() {
        let (hub, _) = setup(SimHubConfig::default().rejecting_option(
            ClientOption::MinimumPollingTime(Duration::ZERO).key(),
        ));
        let (sink, _events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();

        let result = transport.set_option(ClientOption::default_polling());

        assert!(matches!(result, Err(TransportError::OptionRejected { .. })));
        assert!(hub.options_applied().is_empty());
    }

    #[test]
    fn test_inbound_delivery_and_disposition() {
        let (hub, _) = setup(SimHubConfig::default());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();
        assert!(!hub.is_closed("d"));
        hub.queue_inbound("d", message(b"ledId=1").with_message_id("m-1"));

        // Not delivered until inbound is enabled
        transport.do_work();
        assert!(events.try_next().is_none());
        assert_eq!(hub.mailbox_len("d"), 1);

        transport.enable_inbound().unwrap();
        transport.do_work();
        let Some(TransportEvent::Message(delivery)) = events.try_next() else {
            panic!("Expected an inbound message");
        };
        assert_eq!(delivery.message().byte_array().unwrap(), b"ledId=1");
        assert!(delivery.settle(Disposition::Accepted));

        let dispositions = hub.dispositions();
        assert_eq!(dispositions.len(), 1);
        assert_eq!(dispositions[0].message_id.as_deref(), Some("m-1"));
        assert_eq!(
            dispositions[0].outcome,
            DeliveryOutcome::Settled(Disposition::Accepted)
        );
    }

    #[test]
    fn test_close_resolves_pending_as_destroyed() {
        let (hub, _) = setup(SimHubConfig::manual_resolution());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();

        transport.submit(message(b"a"), TrackingToken::new(0)).unwrap();
        transport.close();

        match events.try_next() {
            Some(TransportEvent::Confirmation(c)) => {
                assert_eq!(c.result, ConfirmationResult::BecauseDestroy);
            }
            other => panic!("Expected confirmation, got {:?}", other),
        }
        assert_eq!(hub.open_transports(), 0);
        assert_eq!(hub.connections_made(), 1);
        assert!(hub.is_closed("d"));

        let rejected = transport
            .submit(message(b"b"), TrackingToken::new(1))
            .unwrap_err();
        assert_eq!(rejected.reason, RejectReason::Closed);
        assert_eq!(hub.retained_connections(), 0);
    }

    #[test]
    fn test_closed_connection_kept_until_settled() {
        let (hub, _) = setup(SimHubConfig::default());
        let (sink, mut events) = event_channel();
        let mut transport = hub.connector().connect(&connection(), sink).unwrap();
        hub.queue_inbound("d", message(b"ledId=2"));
        transport.enable_inbound().unwrap();
        transport.do_work();
        let Some(TransportEvent::Message(delivery)) = events.try_next() else {
            panic!("Expected an inbound message");
        };

        transport.close();
        assert!(hub.is_closed("d"));
        assert_eq!(hub.retained_connections(), 1);

        drop(delivery);
        let dispositions = hub.dispositions();
        assert_eq!(dispositions.len(), 1);
        assert_eq!(dispositions[0].outcome, DeliveryOutcome::Dropped);
        assert_eq!(hub.retained_connections(), 0);

        // Reconnecting after pruning works as before
        let (sink, _events) = event_channel();
        let _transport = hub.connector().connect(&connection(), sink).unwrap();
        assert_eq!(hub.retained_connections(), 1);
        assert_eq!(hub.connections_made(), 2);
    }
}
