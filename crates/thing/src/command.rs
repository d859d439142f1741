//! Commands the hub sends to the thing
//!
//! Wire format: `{"Name": "TurnLedOn", "Parameters": {"ledId": 1}}`

use std::ffi::CStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ThingError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedParameters {
    #[serde(rename = "ledId")]
    pub led_id: i32,
}

/// An action the thing can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Name", content = "Parameters")]
pub enum Action {
    TurnLedOn(LedParameters),
    TurnLedOff(LedParameters),
}

impl Action {
    pub fn turn_led_on(led_id: i32) -> Self {
        Action::TurnLedOn(LedParameters { led_id })
    }

    pub fn turn_led_off(led_id: i32) -> Self {
        Action::TurnLedOff(LedParameters { led_id })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::TurnLedOn(_) => "TurnLedOn",
            Action::TurnLedOff(_) => "TurnLedOff",
        }
    }

    pub fn led_id(&self) -> i32 {
        match self {
            Action::TurnLedOn(p) | Action::TurnLedOff(p) => p.led_id,
        }
    }

    /// Parse a command as handed over by the client
    pub fn parse(command: &CStr) -> Result<Self> {
        let text = command.to_str().map_err(|_| ThingError::NotUtf8)?;
        Self::from_json(text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ThingError::Malformed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_turn_led_on() {
        let command = c"{\"Name\":\"TurnLedOn\",\"Parameters\":{\"ledId\":1}}";
        assert_eq!(Action::parse(command).unwrap(), Action::turn_led_on(1));
    }

    #[test]
    fn test_wire_format() {
        let json = Action::turn_led_off(2).to_json().unwrap();
        assert_eq!(json, r#"{"Name":"TurnLedOff","Parameters":{"ledId":2}}"#);
    }

    #[test]
    fn test_unknown_action() {
        let result = Action::from_json(r#"{"Name":"Blink","Parameters":{"ledId":1}}"#);
        assert!(matches!(result, Err(ThingError::Malformed(_))));
    }

    #[test]
    fn test_missing_parameters() {
        let result = Action::from_json(r#"{"Name":"TurnLedOn"}"#);
        assert!(matches!(result, Err(ThingError::Malformed(_))));
    }

    #[test]
    fn test_not_utf8() {
        let command = CStr::from_bytes_with_nul(b"\xff\xfe\0").unwrap();
        assert_eq!(Action::parse(command), Err(ThingError::NotUtf8));
    }
}
