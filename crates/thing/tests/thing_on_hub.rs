//! Thing bound to a client on the simulated hub

use hub_sim::SimHub;
use hublink_client::{ByteMessage, DeviceClient, Disposition};
use hublink_thing::{Action, Telemetry, Thing};

const CONNECTION_STRING: &str = "HostName=h;DeviceId=thing-1;SharedAccessKey=k";

fn command(action: Action) -> ByteMessage {
    ByteMessage::from_vec(action.to_json().unwrap().into_bytes()).unwrap()
}

#[test]
fn test_commands_drive_leds_and_telemetry() {
    let _ = env_logger::builder().is_test(true).try_init();
    let hub = SimHub::default();
    let mut client = DeviceClient::create(CONNECTION_STRING, &hub.connector()).unwrap();
    let thing = Thing::new(client.device_id());
    client.register_model(thing.clone()).unwrap();

    hub.queue_inbound("thing-1", command(Action::turn_led_on(1)));
    hub.queue_inbound("thing-1", command(Action::turn_led_on(7)));
    hub.queue_inbound("thing-1", ByteMessage::from_bytes(b"{not json").unwrap());

    let summary = client.pump();
    assert_eq!(
        summary.dispositions,
        vec![
            Disposition::Accepted,
            Disposition::Abandoned,
            Disposition::Rejected
        ]
    );
    assert_eq!(thing.led(1), Some(true));

    thing.set_readings(23, 51);
    client
        .send_event_owned(thing.telemetry().to_bytes().unwrap())
        .unwrap();
    client.pump();

    let delivered = hub.delivered();
    assert_eq!(delivered.len(), 1);
    let telemetry = Telemetry::from_message(&delivered[0].message).unwrap();
    assert_eq!(telemetry.device_id, "thing-1");
    assert_eq!(telemetry.temperature, 23);
    assert!(telemetry.led1);
    assert!(!telemetry.led2);

    client.destroy();
}
