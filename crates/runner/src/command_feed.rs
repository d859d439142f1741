//! Command Feed - the cloud side of the demo
//!
//! Reads the telemetry the hub received and queues a `TurnLedOn`/`TurnLedOff`
//! command for every LED not in its expected state. Optionally also sends
//! random LED commands now and then.

use hub_sim::SimHub;
use hublink_core::{ByteMessage, DeviceId};
use hublink_thing::{Action, LED_COUNT, Telemetry};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ExpectedLeds;

pub struct CommandFeed {
    hub: SimHub,
    device_id: DeviceId,
    /// Chance of a command per tick
    probability: f64,
    expected: Option<ExpectedLeds>,
    /// Position in the hub's delivered log already checked
    cursor: usize,
    injected: u64,
    corrections: u64,
    rng: StdRng,
}

impl CommandFeed {
    pub fn new(hub: SimHub, device_id: impl Into<DeviceId>, probability: f64) -> Self {
        Self::with_rng(hub, device_id.into(), probability, StdRng::from_entropy())
    }

    /// Create with a specific seed for reproducible runs
    pub fn with_seed(
        hub: SimHub,
        device_id: impl Into<DeviceId>,
        probability: f64,
        seed: u64,
    ) -> Self {
        Self::with_rng(hub, device_id.into(), probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(hub: SimHub, device_id: DeviceId, probability: f64, rng: StdRng) -> Self {
        // Telemetry delivered before the feed existed is not checked
        let cursor = hub.delivered().len();
        Self {
            hub,
            device_id,
            probability: probability.clamp(0.0, 1.0),
            expected: None,
            cursor,
            injected: 0,
            corrections: 0,
            rng,
        }
    }

    /// Enforce `expected` LED states on the device
    pub fn with_expected(mut self, expected: Option<ExpectedLeds>) -> Self {
        self.expected = expected;
        self
    }

    pub fn set_expected(&mut self, expected: ExpectedLeds) {
        if self.expected != Some(expected) {
            info!("Expected LED states for {} now {:?}", self.device_id, expected);
        }
        self.expected = Some(expected);
    }

    pub fn expected(&self) -> Option<ExpectedLeds> {
        self.expected
    }

    /// Check telemetry delivered since the last call against the expected
    /// LED states; returns the corrective commands queued
    pub fn reconcile(&mut self) -> Vec<Action> {
        let fresh = self.hub.delivered_since(self.cursor);
        self.cursor += fresh.len();
        let Some(expected) = self.expected else {
            return Vec::new();
        };

        let device_id = self.device_id.clone();
        let mut sent = Vec::new();
        for delivered in fresh.iter().filter(|d| d.device_id == device_id) {
            let telemetry = match Telemetry::from_message(&delivered.message) {
                Ok(telemetry) => telemetry,
                Err(e) => {
                    debug!("Skipping message {} from {}: {}", delivered.token, device_id, e);
                    continue;
                }
            };

            let reported = [telemetry.led1, telemetry.led2];
            for ((led_id, want), is_on) in expected.by_led().into_iter().zip(reported) {
                if is_on == want {
                    continue;
                }
                warn!("Led{} on {} in unexpected state: {}", led_id, device_id, is_on);
                let action = if want {
                    Action::turn_led_on(led_id)
                } else {
                    Action::turn_led_off(led_id)
                };
                if self.send(action) {
                    self.corrections += 1;
                    sent.push(action);
                }
            }
        }
        sent
    }

    /// Maybe queue a command; returns the action sent
    pub fn tick(&mut self) -> Option<Action> {
        if !self.rng.gen_bool(self.probability) {
            return None;
        }

        let led_id = self.rng.gen_range(1..=LED_COUNT);
        let action = if self.rng.r#gen() {
            Action::turn_led_on(led_id)
        } else {
            Action::turn_led_off(led_id)
        };
        self.send(action).then_some(action)
    }

    /// Queue `action` for the device
    pub fn send(&mut self, action: Action) -> bool {
        let message = match action
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|json| ByteMessage::from_vec(json.into_bytes()).map_err(|e| e.to_string()))
        {
            Ok(message) => message.with_generated_id(),
            Err(e) => {
                warn!("Unable to build {} command: {}", action.name(), e);
                return false;
            }
        };

        debug!(
            "Sending {} (led {}) to {}",
            action.name(),
            action.led_id(),
            self.device_id
        );
        self.hub.queue_inbound(&self.device_id, message);
        self.injected += 1;
        true
    }

    /// Commands queued so far
    pub fn injected(&self) -> u64 {
        self.injected
    }

    /// Commands queued to correct an LED state
    pub fn corrections(&self) -> u64 {
        self.corrections
    }
}
