use crate::protocol::{QoS, v311::ConnectReturnCode};

/// The outcome of a request that completed (or failed) against a pending request slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResult {
    Ok,
    Err,
}

/// An event surfaced by the client to the application.
///
/// One function receives a tagged event per occurrence; the event borrows from the client's
/// reusable rx staging buffer and is only valid for the duration of the callback.
#[derive(Debug)]
pub enum Event<'a> {
    /// A CONNACK was received (or the TCP handshake itself failed).
    Connect { status: ConnectReturnCode },
    /// The connection was torn down, cleanly or not.
    Disconnect { is_accepted: bool },
    /// A QoS 1 or 2 publish this client sent was fully acknowledged, or failed on close.
    Publish { arg: usize, res: RequestResult },
    /// A PUBLISH frame was received from the server.
    PublishRecv {
        topic: &'a str,
        payload: &'a [u8],
        dup: bool,
        qos: QoS,
    },
    /// A SUBSCRIBE this client sent was acknowledged, or failed on close.
    Subscribe { arg: usize, res: RequestResult },
    /// An UNSUBSCRIBE this client sent was acknowledged, or failed on close.
    Unsubscribe { arg: usize, res: RequestResult },
    /// A PINGRESP was received in reply to a keep-alive PINGREQ.
    KeepAlive,
}
