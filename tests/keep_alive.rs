mod common;

use common::MockTransport;
use mqtt_engine::client::{Client, ConnectInfo};
use mqtt_engine::Event;

#[test]
fn keep_alive_pings_after_two_poll_ticks_and_resolves_on_pingresp() {
    let mut client: Client<'_, MockTransport> = Client::new(64, 64, 500);
    let mut transport = MockTransport::new();

    client.connect(ConnectInfo::new("c1").keep_alive(1)).unwrap();
    client.on_active(&mut transport).unwrap();
    transport.take_sent();
    client
        .on_recv(&mut transport, &[0x20, 0x02, 0x00, 0x00], |_| {})
        .unwrap();
    assert!(client.is_connected());

    client.on_poll(&mut transport).unwrap();
    assert!(transport.take_sent().is_empty(), "500ms elapsed, keep-alive is 1s");

    client.on_poll(&mut transport).unwrap();
    assert_eq!(transport.take_sent(), vec![0xC0, 0x00]);

    let mut keep_alive_events = 0;
    client
        .on_recv(&mut transport, &[0xD0, 0x00], |event| {
            keep_alive_events += 1;
            assert!(matches!(event, Event::KeepAlive));
        })
        .unwrap();

    assert_eq!(keep_alive_events, 1);
}
