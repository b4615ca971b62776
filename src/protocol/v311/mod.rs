mod connect;
mod publish;
mod subscribe;

pub use connect::{ConnAck, Connect, ConnectReturnCode, Disconnect, Will};
pub use publish::{PubAck, PubComp, PubRec, PubRel, Publish};
pub use subscribe::{SubAck, SubAckResult, Subscribe, TopicFilter, UnsubAck, Unsubscribe};

use crate::protocol::Packet;
use crate::traits::{Sink, Writable};

/// The PINGREQ packet, sent to keep the connection alive during idle periods.
///
/// Spec: MQTT 3.1.1 §3.12.
#[derive(Debug, Clone, Copy)]
pub struct PingReq;

impl Packet for PingReq {
    const TYPE: u8 = 0x0c;
}

impl Writable for PingReq {
    fn size(&self) -> usize {
        0
    }

    fn write_to<S: Sink>(&self, _sink: &mut S) {}
}

/// The PINGRESP packet, the server's reply to [`PingReq`].
///
/// Spec: MQTT 3.1.1 §3.13.
#[derive(Debug, Clone, Copy)]
pub struct PingResp;

impl Packet for PingResp {
    const TYPE: u8 = 0x0d;
}
