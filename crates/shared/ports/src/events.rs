//! Event channel between a transport and the client that owns it
//!
//! The transport pushes [`TransportEvent`]s into an [`EventSink`]; the client
//! pulls them from the [`EventStream`] inside its work pump. Both ends are
//! used synchronously (`send` / `try_recv`), so no runtime is required.
//!
//! Inbound messages travel with a oneshot reply channel on which the client
//! settles the message with a [`Disposition`].

use hublink_core::{ByteMessage, Confirmation, ConfirmationResult, Disposition, TrackingToken};
use tokio::sync::{mpsc, oneshot};

use crate::error::TransportError;

/// Something the transport reports to the client
#[derive(Debug)]
pub enum TransportEvent {
    /// A submitted message was resolved
    Confirmation(Confirmation),
    /// A cloud-to-device message arrived
    Message(InboundDelivery),
}

/// An inbound message awaiting its disposition
#[derive(Debug)]
pub struct InboundDelivery {
    message: ByteMessage,
    reply_tx: oneshot::Sender<Disposition>,
}

impl InboundDelivery {
    /// Create a delivery and the handle the transport keeps to learn its fate
    pub fn new(message: ByteMessage) -> (Self, PendingDisposition) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (Self { message, reply_tx }, PendingDisposition { reply_rx })
    }

    /// Borrow the inbound message
    pub fn message(&self) -> &ByteMessage {
        &self.message
    }

    /// Report the disposition back to the transport.
    ///
    /// Returns false if the transport is no longer waiting.
    pub fn settle(self, disposition: Disposition) -> bool {
        self.reply_tx.send(disposition).is_ok()
    }
}

/// What became of an inbound delivery, as seen by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Not settled yet
    Pending,
    /// Settled with a disposition
    Settled(Disposition),
    /// Dropped without being settled
    Dropped,
}

/// Transport-side handle on an inbound delivery
#[derive(Debug)]
pub struct PendingDisposition {
    reply_rx: oneshot::Receiver<Disposition>,
}

impl PendingDisposition {
    /// Check whether the client has settled the delivery
    pub fn poll(&mut self) -> DeliveryOutcome {
        match self.reply_rx.try_recv() {
            Ok(disposition) => DeliveryOutcome::Settled(disposition),
            Err(oneshot::error::TryRecvError::Empty) => DeliveryOutcome::Pending,
            Err(oneshot::error::TryRecvError::Closed) => DeliveryOutcome::Dropped,
        }
    }
}

/// Transport side of the event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventSink {
    /// Report the outcome of a send
    pub fn confirm(
        &self,
        token: TrackingToken,
        result: ConfirmationResult,
    ) -> Result<(), TransportError> {
        self.tx
            .send(TransportEvent::Confirmation(Confirmation::new(token, result)))
            .map_err(|_| TransportError::ChannelClosed)
    }

    /// Hand an inbound message to the client
    pub fn deliver(&self, message: ByteMessage) -> Result<PendingDisposition, TransportError> {
        let (delivery, pending) = InboundDelivery::new(message);
        self.tx
            .send(TransportEvent::Message(delivery))
            .map_err(|_| TransportError::ChannelClosed)?;
        Ok(pending)
    }

    /// True once the client side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Client side of the event channel
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl EventStream {
    /// Take the next queued event without blocking
    pub fn try_next(&mut self) -> Option<TransportEvent> {
        self.rx.try_recv().ok()
    }
}

/// Create a connected sink/stream pair
pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventStream { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (sink, mut stream) = event_channel();

        sink.confirm(TrackingToken::new(1), ConfirmationResult::Ok)
            .unwrap();
        let _pending = sink.deliver(ByteMessage::from_bytes(b"x").unwrap()).unwrap();

        assert!(matches!(
            stream.try_next(),
            Some(TransportEvent::Confirmation(c)) if c.token == TrackingToken::new(1)
        ));
        assert!(matches!(stream.try_next(), Some(TransportEvent::Message(_))));
        assert!(stream.try_next().is_none());
    }

    #[test]
    fn test_settle_reaches_transport() {
        let (sink, mut stream) = event_channel();
        let mut pending = sink.deliver(ByteMessage::from_bytes(b"x").unwrap()).unwrap();
        assert_eq!(pending.poll(), DeliveryOutcome::Pending);

        let Some(TransportEvent::Message(delivery)) = stream.try_next() else {
            panic!("expected inbound delivery");
        };
        assert!(delivery.settle(Disposition::Rejected));
        assert_eq!(
            pending.poll(),
            DeliveryOutcome::Settled(Disposition::Rejected)
        );
    }

    #[test]
    fn test_unsettled_delivery_is_dropped() {
        let (sink, mut stream) = event_channel();
        let mut pending = sink.deliver(ByteMessage::from_bytes(b"x").unwrap()).unwrap();

        drop(stream.try_next());
        assert_eq!(pending.poll(), DeliveryOutcome::Dropped);
    }

    #[test]
    fn test_sink_fails_after_stream_dropped() {
        let (sink, stream) = event_channel();
        drop(stream);

        assert!(sink.is_closed());
        assert_eq!(
            sink.confirm(TrackingToken::new(0), ConfirmationResult::Ok),
            Err(TransportError::ChannelClosed)
        );
    }
}
