mod common;

use common::MockTransport;
use mqtt_engine::client::Client;
use mqtt_engine::protocol::QoS;
use mqtt_engine::Event;

#[test]
fn qos2_inbound_publish_drives_pubrec_pubrel_pubcomp_handshake() {
    let mut client: Client<'_, MockTransport> = Client::new(64, 64, 500);
    let mut transport = MockTransport::new();
    common::handshake(&mut client, &mut transport);

    // PUBLISH, topic "a/b", packet id 7, qos 2, payload "XY".
    let inbound_publish = [
        0x34, 0x09, 0x00, 0x03, 0x61, 0x2F, 0x62, 0x00, 0x07, 0x58, 0x59,
    ];

    let mut recv_events = 0;
    client
        .on_recv(&mut transport, &inbound_publish, |event| {
            recv_events += 1;
            match event {
                Event::PublishRecv { topic, payload, dup, qos } => {
                    assert_eq!(topic, "a/b");
                    assert_eq!(payload, b"XY");
                    assert!(!dup);
                    assert_eq!(qos, QoS::ExactlyOnce);
                }
                other => panic!("unexpected event: {other:?}"),
            }
        })
        .unwrap();

    assert_eq!(recv_events, 1);
    assert_eq!(transport.take_sent(), vec![0x50, 0x02, 0x00, 0x07]);

    // PUBREL for packet id 7 should produce PUBCOMP and no further app-visible event.
    let mut other_events = 0;
    client
        .on_recv(&mut transport, &[0x62, 0x02, 0x00, 0x07], |_| other_events += 1)
        .unwrap();

    assert_eq!(other_events, 0);
    assert_eq!(transport.take_sent(), vec![0x70, 0x02, 0x00, 0x07]);
}
