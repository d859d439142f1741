//! Device loop
//!
//! Runs a [`Thing`] behind a [`DeviceClient`] on the simulated hub:
//!
//! - every send interval: read sensors, send telemetry
//! - every pump interval: let the cloud correct LEDs from the telemetry it
//!   received (and maybe send a random command), then pump
//! - every refresh interval: reload the expected LED states, if from a file
//!
//! The client is single-threaded, so the loop runs on the current task.

use std::future::{Future, pending};
use std::sync::Arc;

use hub_sim::SimHub;
use hublink_client::{Confirmation, DeviceClient, Disposition, Transport, WorkSummary};
use hublink_thing::Thing;
use log::{error, info, warn};
use tokio::time::{MissedTickBehavior, interval};

use crate::clock::TokioClock;
use crate::command_feed::CommandFeed;
use crate::config::{ExpectedLeds, RunnerConfig};
use crate::error::Result;
use crate::sensors::SensorSimulator;

/// What happened during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Telemetry messages accepted by the transport
    pub sends: u64,
    /// Telemetry messages that could not be sent
    pub send_failures: u64,
    pub confirmed_ok: u64,
    /// Confirmations other than ok (timeout, error, destroy)
    pub confirmed_failed: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub abandoned: u64,
    /// Cloud commands queued by the feed
    pub commands_injected: u64,
    /// Commands among them sent to correct an LED state
    pub corrections: u64,
    /// LED states at the end of the run
    pub leds: [bool; 2],
}

impl RunReport {
    fn record(&mut self, summary: &WorkSummary) {
        self.record_confirmations(&summary.confirmations);
        for disposition in &summary.dispositions {
            match disposition {
                Disposition::Accepted => self.accepted += 1,
                Disposition::Rejected => self.rejected += 1,
                Disposition::Abandoned => self.abandoned += 1,
            }
        }
    }

    fn record_confirmations(&mut self, confirmations: &[Confirmation]) {
        for confirmation in confirmations {
            if confirmation.result.is_success() {
                self.confirmed_ok += 1;
            } else {
                self.confirmed_failed += 1;
            }
        }
    }

    /// Sends that have been resolved one way or another
    pub fn confirmations(&self) -> u64 {
        self.confirmed_ok + self.confirmed_failed
    }

    pub fn dispositions(&self) -> u64 {
        self.accepted + self.rejected + self.abandoned
    }
}

pub struct DeviceRunner {
    config: RunnerConfig,
    hub: SimHub,
}

impl DeviceRunner {
    /// Create a runner with its own hub, timed by the tokio clock
    pub fn new(config: RunnerConfig) -> Self {
        let hub = SimHub::with_clock(config.hub.clone(), Arc::new(TokioClock::new()));
        Self { config, hub }
    }

    /// Create a runner on an existing hub
    pub fn with_hub(config: RunnerConfig, hub: SimHub) -> Self {
        Self { config, hub }
    }

    pub fn hub(&self) -> &SimHub {
        &self.hub
    }

    /// Run until the configured duration elapses (forever if unset)
    pub async fn run(&self) -> Result<RunReport> {
        self.run_until(pending()).await
    }

    /// Run until the configured duration elapses or `shutdown` completes.
    ///
    /// Fails only if the client cannot be set up; everything after that is
    /// logged and counted in the report.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) -> Result<RunReport> {
        self.config.validate()?;

        let mut client = DeviceClient::create(&self.config.connection_string, &self.hub.connector())
            .inspect_err(|e| error!("Unable to set up device client: {}", e))?;

        let thing = Thing::new(client.device_id());
        client.register_model(thing.clone())?;

        let mut sensors = match self.config.seed {
            Some(seed) => SensorSimulator::with_seed(self.config.sensors.clone(), seed),
            None => SensorSimulator::new(self.config.sensors.clone()),
        };
        let mut feed = match self.config.seed {
            Some(seed) => CommandFeed::with_seed(
                self.hub.clone(),
                client.device_id(),
                self.config.command_probability,
                seed.wrapping_add(1),
            ),
            None => CommandFeed::new(
                self.hub.clone(),
                client.device_id(),
                self.config.command_probability,
            ),
        }
        .with_expected(self.config.expected_leds);
        let states_file = self.config.expected_states_file.as_deref();

        let mut send_tick = interval(self.config.send_interval());
        send_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut pump_tick = interval(self.config.pump_interval());
        pump_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh_tick = interval(self.config.expected_refresh());
        refresh_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let stop = async {
            match self.config.duration() {
                Some(duration) => tokio::time::sleep(duration).await,
                None => pending::<()>().await,
            }
        };
        tokio::pin!(stop);
        tokio::pin!(shutdown);

        info!(
            "Device {} running (telemetry every {:?}, pump every {:?})",
            client.device_id(),
            self.config.send_interval(),
            self.config.pump_interval()
        );

        let mut report = RunReport::default();
        loop {
            tokio::select! {
                _ = &mut stop => {
                    info!("Run duration elapsed");
                    break;
                }
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = send_tick.tick() => {
                    send_telemetry(&mut client, &thing, &mut sensors, &mut report);
                }
                _ = refresh_tick.tick(), if states_file.is_some() => {
                    if let Some(path) = states_file {
                        reload_expected(&mut feed, path);
                    }
                }
                _ = pump_tick.tick() => {
                    feed.reconcile();
                    feed.tick();
                    let summary = client.pump();
                    report.record(&summary);
                }
            }
        }

        let leftovers = client.destroy();
        report.record_confirmations(&leftovers);
        report.commands_injected = feed.injected();
        report.corrections = feed.corrections();
        report.leds = [
            thing.led(1).unwrap_or(false),
            thing.led(2).unwrap_or(false),
        ];

        info!(
            "Run finished: {} sent, {} confirmed ok, {} failed, {} commands handled",
            report.sends,
            report.confirmed_ok,
            report.confirmed_failed,
            report.dispositions()
        );
        Ok(report)
    }
}

/// Keep the current expected states if the file cannot be read
fn reload_expected(feed: &mut CommandFeed, path: &str) {
    match ExpectedLeds::from_file(path) {
        Ok(expected) => feed.set_expected(expected),
        Err(e) => warn!("Keeping expected LED states {:?}: {}", feed.expected(), e),
    }
}

fn send_telemetry<T: Transport>(
    client: &mut DeviceClient<T>,
    thing: &Thing,
    sensors: &mut SensorSimulator,
    report: &mut RunReport,
) {
    let reading = sensors.next_reading();
    thing.set_readings(reading.temperature, reading.humidity);
    if reading.button_pressed {
        thing.press_button();
    }

    let payload = match thing.telemetry().to_bytes() {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Unable to serialize telemetry: {}", e);
            report.send_failures += 1;
            return;
        }
    };

    match client.send_event_owned(payload) {
        Ok(_) => report.sends += 1,
        Err(e) => {
            warn!("Telemetry not sent: {}", e);
            report.send_failures += 1;
        }
    }
}
