use hublink_core::{ByteMessage, DeviceId};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThingError};

/// Readings reported to the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Telemetry {
    pub device_id: DeviceId,
    pub temperature: i32,
    pub humidity: i32,
    pub led1: bool,
    pub led2: bool,
    pub button_pressed: bool,
}

impl Telemetry {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Owned JSON bytes, ready for `send_event_owned`
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a telemetry message received by the hub
    pub fn from_message(message: &ByteMessage) -> Result<Self> {
        let bytes = message
            .byte_array()
            .map_err(|e| ThingError::Malformed(e.to_string()))?;
        Ok(serde_json::from_slice(bytes)?)
    }
}
