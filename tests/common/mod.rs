use std::convert::Infallible;

use mqtt_engine::client::{Client, ConnectInfo};
use mqtt_engine::Transport;

/// A synchronous stand-in transport: `send` appends to a record instead of touching a socket,
/// and accepts at most `cap` bytes per call so chunked-flush behaviour can be exercised.
pub struct MockTransport {
    pub sent: Vec<u8>,
    pub closed: bool,
    cap: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            closed: false,
            cap: usize::MAX,
        }
    }

    pub fn with_send_cap(cap: usize) -> Self {
        Self {
            sent: Vec::new(),
            closed: false,
            cap,
        }
    }

    /// Drains everything sent so far, for comparing one packet's worth of bytes at a time.
    pub fn take_sent(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }
}

impl Transport for MockTransport {
    type Error = Infallible;

    fn send(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        let n = data.len().min(self.cap);
        self.sent.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// Drives a fresh client through a clean CONNECT/CONNACK handshake and discards the CONNECT
/// bytes, leaving `transport` empty and `client` in the CONNECTED state, for tests whose focus
/// is on what happens afterwards.
pub fn handshake<const N: usize>(client: &mut Client<'static, MockTransport, N>, transport: &mut MockTransport) {
    client.connect(ConnectInfo::new("c1").keep_alive(60)).unwrap();
    client.on_active(transport).unwrap();
    transport.take_sent();
    client.on_recv(transport, &[0x20, 0x02, 0x00, 0x00], |_| {}).unwrap();
    assert!(client.is_connected());
}
