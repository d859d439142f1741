//! Device state and command execution

use std::ffi::CStr;
use std::sync::Arc;

use hublink_core::{DeviceId, ExecuteCommandResult};
use hublink_ports::DeviceModel;
use log::{info, warn};
use parking_lot::Mutex;

use crate::command::Action;
use crate::error::{Result, ThingError};
use crate::telemetry::Telemetry;

/// LEDs are numbered from 1
pub const LED_COUNT: i32 = 2;

#[derive(Debug, Clone, Default)]
struct ThingState {
    device_id: DeviceId,
    temperature: i32,
    humidity: i32,
    leds: [bool; LED_COUNT as usize],
    button_pressed: bool,
    commands_executed: u64,
}

/// Handle to the thing's state
///
/// Clones share state: bind one clone to the client and keep another to read
/// the LEDs and report telemetry.
#[derive(Debug, Clone, Default)]
pub struct Thing {
    state: Arc<Mutex<ThingState>>,
}

impl Thing {
    pub fn new(device_id: impl Into<DeviceId>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ThingState {
                device_id: device_id.into(),
                ..Default::default()
            })),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.state.lock().device_id.clone()
    }

    pub fn set_readings(&self, temperature: i32, humidity: i32) {
        let mut state = self.state.lock();
        state.temperature = temperature;
        state.humidity = humidity;
    }

    /// Latch a button press until the next telemetry snapshot
    pub fn press_button(&self) {
        self.state.lock().button_pressed = true;
    }

    /// LED state, `None` for an unknown id
    pub fn led(&self, led_id: i32) -> Option<bool> {
        let index = led_index(led_id).ok()?;
        Some(self.state.lock().leds[index])
    }

    pub fn commands_executed(&self) -> u64 {
        self.state.lock().commands_executed
    }

    /// Current readings; clears the latched button press
    pub fn telemetry(&self) -> Telemetry {
        let mut state = self.state.lock();
        let button_pressed = std::mem::take(&mut state.button_pressed);
        Telemetry {
            device_id: state.device_id.clone(),
            temperature: state.temperature,
            humidity: state.humidity,
            led1: state.leds[0],
            led2: state.leds[1],
            button_pressed,
        }
    }

    /// Perform an action
    pub fn apply(&self, action: &Action) -> Result<()> {
        let index = led_index(action.led_id())?;
        let mut state = self.state.lock();
        state.leds[index] = matches!(action, Action::TurnLedOn(_));
        state.commands_executed += 1;
        info!(
            "{}: {} (led {})",
            state.device_id,
            action.name(),
            action.led_id()
        );
        Ok(())
    }
}

fn led_index(led_id: i32) -> Result<usize> {
    if (1..=LED_COUNT).contains(&led_id) {
        Ok((led_id - 1) as usize)
    } else {
        Err(ThingError::UnknownLed(led_id))
    }
}

impl DeviceModel for Thing {
    fn execute_command(&mut self, command: &CStr) -> ExecuteCommandResult {
        let action = match Action::parse(command) {
            Ok(action) => action,
            Err(e) => {
                warn!("Rejecting command: {}", e);
                return ExecuteCommandResult::Rejected;
            }
        };

        match self.apply(&action) {
            Ok(()) => ExecuteCommandResult::Success,
            Err(e) => {
                warn!("Failed to execute {}: {}", action.name(), e);
                ExecuteCommandResult::Error
            }
        }
    }

    fn name(&self) -> &str {
        "Thing"
    }
}
