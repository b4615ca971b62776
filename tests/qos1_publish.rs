mod common;

use common::MockTransport;
use mqtt_engine::client::{Client, RequestResult};
use mqtt_engine::protocol::QoS;
use mqtt_engine::Event;

#[test]
fn qos1_publish_round_trip_resolves_on_puback() {
    let mut client: Client<'_, MockTransport> = Client::new(64, 64, 500);
    let mut transport = MockTransport::new();
    common::handshake(&mut client, &mut transport);

    client
        .publish(&mut transport, "a/b", b"hi", QoS::AtLeastOnce, false, 99)
        .unwrap();

    assert_eq!(
        transport.take_sent(),
        vec![0x32, 0x09, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x01, 0x68, 0x69],
    );

    let mut publish_events = 0;
    client
        .on_recv(&mut transport, &[0x40, 0x02, 0x00, 0x01], |event| {
            publish_events += 1;
            match event {
                Event::Publish { arg, res } => {
                    assert_eq!(arg, 99);
                    assert_eq!(res, RequestResult::Ok);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        })
        .unwrap();

    assert_eq!(publish_events, 1);
}
