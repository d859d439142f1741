//! Device Loop Integration Test
//!
//! Runs the demo device against the simulated hub with tokio's paused
//! clock, so a run of several seconds completes instantly.

use hub_sim::{SimHub, SimHubConfig};
use hublink_client::ClientError;
use hublink_runner::{DeviceRunner, ExpectedLeds, RunnerConfig, RunnerError, TokioClock};
use hublink_thing::Telemetry;
use std::sync::Arc;
use std::time::Duration;

fn quick_config() -> RunnerConfig {
    RunnerConfig {
        send_interval_ms: 1000,
        pump_interval_ms: 100,
        duration_secs: Some(10),
        seed: Some(42),
        command_probability: 0.0,
        ..Default::default()
    }
}

/// Every send is resolved exactly once, ok or otherwise
#[tokio::test(start_paused = true)]
async fn test_every_send_is_confirmed() {
    let runner = DeviceRunner::new(quick_config());

    let report = runner.run().await.unwrap();

    assert!(report.sends >= 10, "Expected a send per second, got {}", report.sends);
    assert_eq!(report.send_failures, 0);
    assert_eq!(report.confirmations(), report.sends);
    assert!(report.confirmed_ok > 0);
    assert_eq!(runner.hub().delivered().len() as u64, report.confirmed_ok);
    assert_eq!(runner.hub().open_transports(), 0);
}

/// Telemetry reaches the hub as PascalCase JSON
#[tokio::test(start_paused = true)]
async fn test_telemetry_payload() {
    let runner = DeviceRunner::new(quick_config());

    runner.run().await.unwrap();

    let delivered = runner.hub().delivered();
    assert!(!delivered.is_empty());
    for message in delivered {
        let telemetry = Telemetry::from_message(&message.message).unwrap();
        assert_eq!(telemetry.device_id, "thing-1");
        assert!((0..=100).contains(&telemetry.humidity));
    }
}

/// Polling interval applied at create limits how often the hub sees batches
#[tokio::test(start_paused = true)]
async fn test_polling_interval_applied() {
    let runner = DeviceRunner::new(quick_config());

    runner.run().await.unwrap();

    let options = runner.hub().options_applied();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].key, "MinimumPollingTime");
    assert_eq!(options[0].value, 2);
}

/// Every cloud command is handled by the thing
#[tokio::test(start_paused = true)]
async fn test_commands_are_handled() {
    let config = RunnerConfig {
        command_probability: 1.0,
        expected_leds: None,
        duration_secs: Some(2),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner.run().await.unwrap();

    assert!(report.commands_injected > 0);
    assert_eq!(report.accepted, report.commands_injected);
    assert_eq!(report.rejected, 0);
    assert_eq!(report.abandoned, 0);

    let dispositions = runner.hub().dispositions();
    assert_eq!(dispositions.len() as u64, report.commands_injected);
    assert!(dispositions.iter().all(|d| d.message_id.is_some()));
}

/// LEDs converge on the expected states from the first telemetry report
#[tokio::test(start_paused = true)]
async fn test_leds_converge_on_expected_states() {
    let config = RunnerConfig {
        expected_leds: Some(ExpectedLeds {
            led1: true,
            led2: true,
        }),
        duration_secs: Some(5),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner.run().await.unwrap();

    assert_eq!(report.leds, [true, true]);
    assert_eq!(report.corrections, 2);
    assert_eq!(report.commands_injected, 2);
    assert_eq!(report.accepted, 2);

    let delivered = runner.hub().delivered();
    let first = Telemetry::from_message(&delivered[0].message).unwrap();
    assert!(!first.led1 && !first.led2);
    let last = Telemetry::from_message(&delivered[delivered.len() - 1].message).unwrap();
    assert!(last.led1 && last.led2);
}

/// A device already in the expected state gets no commands
#[tokio::test(start_paused = true)]
async fn test_matching_state_needs_no_corrections() {
    let config = RunnerConfig {
        expected_leds: Some(ExpectedLeds {
            led1: false,
            led2: false,
        }),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner.run().await.unwrap();

    assert!(report.confirmed_ok > 0);
    assert_eq!(report.corrections, 0);
    assert_eq!(report.commands_injected, 0);
    assert!(runner.hub().dispositions().is_empty());
}

/// Expected states are reloaded from their file during the run
#[tokio::test(start_paused = true)]
async fn test_expected_states_file_is_reloaded() {
    let path = std::env::temp_dir().join(format!(
        "hublink-expected-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{ "led1": false, "led2": true }"#).unwrap();
    let config = RunnerConfig {
        expected_leds: None,
        expected_states_file: Some(path.display().to_string()),
        expected_refresh_ms: 1000,
        duration_secs: Some(5),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner.run().await.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(report.leds, [false, true]);
    assert!(report.corrections >= 1);
}

/// An unreadable states file leaves the configured states in force
#[tokio::test(start_paused = true)]
async fn test_missing_states_file_keeps_expected() {
    let config = RunnerConfig {
        expected_leds: Some(ExpectedLeds {
            led1: true,
            led2: false,
        }),
        expected_states_file: Some("/nonexistent/hublink-expected.json".to_string()),
        duration_secs: Some(5),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner.run().await.unwrap();

    assert_eq!(report.leds, [true, false]);
    assert_eq!(report.corrections, 1);
}

/// Shutdown future ends a run with no duration
#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_run() {
    let config = RunnerConfig {
        duration_secs: None,
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let report = runner
        .run_until(tokio::time::sleep(Duration::from_millis(2500)))
        .await
        .unwrap();

    assert!((2..=4).contains(&report.sends), "Got {} sends", report.sends);
    assert_eq!(report.confirmations(), report.sends);
}

/// A refused connection is fatal for the run
#[tokio::test(start_paused = true)]
async fn test_setup_failure_is_reported() {
    let hub = SimHub::with_clock(
        SimHubConfig {
            accept_connections: false,
            ..Default::default()
        },
        Arc::new(TokioClock::new()),
    );
    let runner = DeviceRunner::with_hub(quick_config(), hub);

    let result = runner.run().await;

    assert!(matches!(
        result,
        Err(RunnerError::Client(ClientError::Setup(_)))
    ));
}

/// Invalid configuration is caught before connecting
#[tokio::test]
async fn test_invalid_config() {
    let config = RunnerConfig {
        connection_string: "DeviceId=only".to_string(),
        ..quick_config()
    };
    let runner = DeviceRunner::new(config);

    let result = runner.run().await;

    assert!(matches!(result, Err(RunnerError::Config(_))));
    assert_eq!(runner.hub().connections_made(), 0);
}
