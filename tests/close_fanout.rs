mod common;

use common::MockTransport;
use mqtt_engine::client::{Client, RequestResult};
use mqtt_engine::protocol::QoS;
use mqtt_engine::Event;

#[test]
fn close_fanout_fails_every_pending_request_in_id_order() {
    let mut client: Client<'_, MockTransport, 4> = Client::new(128, 64, 500);
    let mut transport = MockTransport::new();
    common::handshake(&mut client, &mut transport);

    client.publish(&mut transport, "a", b"1", QoS::AtLeastOnce, false, 1).unwrap();
    client.publish(&mut transport, "b", b"2", QoS::AtLeastOnce, false, 2).unwrap();
    client.subscribe(&mut transport, "c", QoS::AtMostOnce, 3).unwrap();
    transport.take_sent();

    let mut events = Vec::new();
    client.on_close(|event| {
        events.push(match event {
            Event::Disconnect { is_accepted } => format!("disconnect:{is_accepted}"),
            Event::Publish { arg, res } => format!("publish:{arg}:{res:?}"),
            Event::Subscribe { arg, res } => format!("subscribe:{arg}:{res:?}"),
            other => panic!("unexpected event: {other:?}"),
        });
    });

    assert_eq!(
        events,
        vec![
            "disconnect:true".to_string(),
            format!("publish:1:{:?}", RequestResult::Err),
            format!("publish:2:{:?}", RequestResult::Err),
            format!("subscribe:3:{:?}", RequestResult::Err),
        ],
    );
    assert!(!client.is_connected());
}
