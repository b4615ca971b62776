use core::fmt;

/// A MQTT client error.
#[derive(Debug)]
pub enum Error<E> {
    /// An operation that requires an established session was attempted while disconnected.
    NotConnected,
    /// `connect` was called while a connection attempt was already in flight.
    AlreadyConnecting,
    /// The peer sent data that violates the protocol; the violation was logged and ignored.
    ProtocolViolation,
    /// The request table has no free slot for a new subscribe/unsubscribe/QoS publish.
    RequestTableFull,
    /// The tx buffer does not have enough free space to encode the packet.
    OutOfMemory,
    /// `connect` was called with an empty client id.
    InvalidClientId,
    /// An underlying error occurred on the transport.
    Transport(E),
}

impl<E> From<E> for Error<E> {
    fn from(value: E) -> Self {
        Self::Transport(value)
    }
}

impl<E> fmt::Display for Error<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "the client is not connected"),
            Self::AlreadyConnecting => write!(f, "a connection attempt is already in progress"),
            Self::ProtocolViolation => write!(f, "the peer violated the MQTT protocol"),
            Self::RequestTableFull => write!(f, "no free slot in the request table"),
            Self::OutOfMemory => write!(f, "the tx buffer has no room for this packet"),
            Self::InvalidClientId => write!(f, "the client id must not be empty"),
            Self::Transport(err) => write!(f, "a transport error occurred: {err}"),
        }
    }
}

impl<E> core::error::Error for Error<E> where E: core::error::Error {}

/// A MQTT client result.
pub type Result<T, E> = core::result::Result<T, Error<E>>;
