//! Records kept by the hub simulator for inspection

use hublink_core::{ByteMessage, DeviceId, Timestamp, TrackingToken};
use hublink_ports::DeliveryOutcome;

/// A send the transport accepted but has not resolved yet
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub device_id: DeviceId,
    pub token: TrackingToken,
    pub message: ByteMessage,
    pub submitted_at: Timestamp,
    /// True once the message left the device-side queue
    pub flushed: bool,
}

/// A device-to-cloud message the hub acknowledged
#[derive(Debug, Clone)]
pub struct DeliveredMessage {
    pub device_id: DeviceId,
    pub token: TrackingToken,
    pub message: ByteMessage,
    pub delivered_at: Timestamp,
}

/// Fate of a cloud-to-device message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionRecord {
    pub device_id: DeviceId,
    pub message_id: Option<String>,
    pub outcome: DeliveryOutcome,
}

/// An option a transport applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOption {
    pub device_id: DeviceId,
    pub key: &'static str,
    pub value: u64,
}
