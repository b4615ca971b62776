mod common;

use common::MockTransport;
use mqtt_engine::client::{Client, ConnectInfo};
use mqtt_engine::protocol::v311::ConnectReturnCode;
use mqtt_engine::Event;

#[test]
fn clean_connect_emits_connect_bytes_and_accepts_connack() {
    let mut client: Client<'_, MockTransport> = Client::new(64, 64, 500);
    let mut transport = MockTransport::new();

    client.connect(ConnectInfo::new("c1").keep_alive(60)).unwrap();
    client.on_active(&mut transport).unwrap();

    assert_eq!(
        transport.take_sent(),
        vec![
            0x10, 0x0E, 0x00, 0x04, 0x4D, 0x51, 0x54, 0x54, 0x04, 0x02, 0x00, 0x3C, 0x00, 0x02,
            0x63, 0x31,
        ],
    );
    assert!(!client.is_connected());

    let mut connect_events = 0;
    client
        .on_recv(&mut transport, &[0x20, 0x02, 0x00, 0x00], |event| {
            connect_events += 1;
            match event {
                Event::Connect { status } => assert_eq!(status, ConnectReturnCode::Accepted),
                other => panic!("unexpected event: {other:?}"),
            }
        })
        .unwrap();

    assert_eq!(connect_events, 1);
    assert!(client.is_connected());
}
