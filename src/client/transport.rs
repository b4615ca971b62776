/// The byte-oriented connection the engine is generic over.
///
/// The engine performs no I/O of its own; every [`Client`](crate::client::Client) entry point
/// that needs to move bytes takes a transport by mutable reference for the duration of the
/// call. This mirrors the "weak" reference described for the connection: the transport is owned
/// by whatever is driving the event loop, the client only ever borrows it.
///
/// Sends are non-blocking submissions. A transport that cannot accept the whole slice should
/// return the number of bytes it did accept rather than erroring; the client tracks the
/// difference and leaves the rest queued in its tx buffer for the next send attempt.
pub trait Transport {
    type Error;

    /// Submits `data` for transmission, returning the number of leading bytes accepted.
    fn send(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Requests a non-blocking close of the connection.
    fn close(&mut self);
}
