use crate::protocol::types::EncodedStr;
use crate::protocol::utils::CursorExt;
use crate::protocol::{Packet, PacketError, PacketParse, ParseResult, QoS};
use crate::traits::{Sink, Writable};
use crate::utils::Cursor;

const PROTOCOL_NAME: &str = "MQTT";
const PROTOCOL_LEVEL: u8 = 4;

const FLAG_USERNAME: u8 = 0x80;
const FLAG_PASSWORD: u8 = 0x40;
const FLAG_WILL_RETAIN: u8 = 0x20;
const FLAG_WILL: u8 = 0x04;
const FLAG_CLEAN_SESSION: u8 = 0x02;

/// A `Will` to be published by the server on the client's behalf if the connection is lost
/// without a clean [`Disconnect`](super::Disconnect).
///
/// Spec: MQTT 3.1.1 §3.1.2.5.
#[derive(Debug, Clone, Copy)]
pub struct Will<'a> {
    pub retain: bool,
    pub qos: QoS,
    pub topic: &'a str,
    pub message: &'a str,
}

/// The CONNECT packet, sent once by the client after the transport becomes active.
///
/// Spec: MQTT 3.1.1 §3.1.
#[derive(Debug, Clone, Copy)]
pub struct Connect<'a> {
    pub client_id: &'a str,
    pub keep_alive: u16,
    pub clean_session: bool,
    pub will: Option<Will<'a>>,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

impl Packet for Connect<'_> {
    const TYPE: u8 = 0x01;
}

impl Connect<'_> {
    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.clean_session {
            flags |= FLAG_CLEAN_SESSION;
        }
        if let Some(will) = &self.will {
            flags |= FLAG_WILL;
            flags |= (u8::from(will.qos) & 0b11) << 3;
            if will.retain {
                flags |= FLAG_WILL_RETAIN;
            }
        }
        if self.username.is_some() {
            flags |= FLAG_USERNAME;
        }
        if self.password.is_some() {
            flags |= FLAG_PASSWORD;
        }
        flags
    }
}

impl Writable for Connect<'_> {
    fn size(&self) -> usize {
        EncodedStr(PROTOCOL_NAME).size()
            + 1 // protocol level
            + 1 // connect flags
            + 2 // keep alive
            + EncodedStr(self.client_id).size()
            + self
                .will
                .map(|w| EncodedStr(w.topic).size() + EncodedStr(w.message).size())
                .unwrap_or(0)
            + self.username.map(EncodedStr).size()
            + self.password.map(EncodedStr).size()
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        EncodedStr(PROTOCOL_NAME).write_to(sink);
        PROTOCOL_LEVEL.write_to(sink);
        self.flags().write_to(sink);
        self.keep_alive.write_to(sink);
        EncodedStr(self.client_id).write_to(sink);
        if let Some(will) = &self.will {
            EncodedStr(will.topic).write_to(sink);
            EncodedStr(will.message).write_to(sink);
        }
        self.username.map(EncodedStr).write_to(sink);
        self.password.map(EncodedStr).write_to(sink);
    }
}

/// The reason given in a [`ConnAck`] packet, a.k.a. the "connect return code".
///
/// Spec: MQTT 3.1.1 §3.2.2.3. The list is exhaustive; servers that reject the connection for
/// any other reason MUST close the network connection without a CONNACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectReturnCode {
    Accepted = 0x00,
    UnacceptableProtocolVersion = 0x01,
    IdentifierRejected = 0x02,
    ServerUnavailable = 0x03,
    BadUsernameOrPassword = 0x04,
    NotAuthorized = 0x05,
}

impl ConnectReturnCode {
    fn from_u8(value: u8) -> Result<Self, PacketError> {
        match value {
            0x00 => Ok(Self::Accepted),
            0x01 => Ok(Self::UnacceptableProtocolVersion),
            0x02 => Ok(Self::IdentifierRejected),
            0x03 => Ok(Self::ServerUnavailable),
            0x04 => Ok(Self::BadUsernameOrPassword),
            0x05 => Ok(Self::NotAuthorized),
            _ => Err(PacketError::ProtocolError),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Acknowledgement of a [`Connect`] attempt.
///
/// Spec: MQTT 3.1.1 §3.2.
#[derive(Debug)]
pub struct ConnAck {
    pub session_present: bool,
    pub return_code: ConnectReturnCode,
}

impl Packet for ConnAck {
    const TYPE: u8 = 0x02;
}

impl ConnAck {
    /// Parses the body of a CONNACK (everything after the fixed header) directly out of
    /// `data`, without requiring the fixed header to be re-synthesized first. The hot inbound
    /// dispatch path calls this straight on the parser's zero-copy `(header, payload)` split.
    pub(crate) fn parse_body(data: &[u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);

        let ack_flags = cursor.read_u8()?;
        let return_code = ConnectReturnCode::from_u8(cursor.read_u8()?)?;

        Ok((
            cursor.position(),
            Self {
                session_present: ack_flags & 0x01 != 0,
                return_code,
            },
        ))
    }
}

impl<'a> PacketParse<'a> for ConnAck {
    fn parse(data: &'a [u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);

        let _fixed_header = cursor.read_fixed_header::<Self>()?;

        let offset = cursor.position();
        let (body_len, this) = Self::parse_body(&data[offset..])?;
        Ok((offset + body_len, this))
    }
}

/// The DISCONNECT packet: a clean, client-initiated termination.
///
/// Spec: MQTT 3.1.1 §3.14.
#[derive(Debug, Clone, Copy)]
pub struct Disconnect;

impl Packet for Disconnect {
    const TYPE: u8 = 0x0e;
}

impl Writable for Disconnect {
    fn size(&self) -> usize {
        0
    }

    fn write_to<S: Sink>(&self, _sink: &mut S) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_flags_clean_session_only() {
        let connect = Connect {
            client_id: "abc",
            keep_alive: 60,
            clean_session: true,
            will: None,
            username: None,
            password: None,
        };
        assert_eq!(connect.flags(), FLAG_CLEAN_SESSION);
    }

    #[test]
    fn test_connect_flags_with_will_and_credentials() {
        let connect = Connect {
            client_id: "abc",
            keep_alive: 60,
            clean_session: false,
            will: Some(Will {
                retain: true,
                qos: QoS::ExactlyOnce,
                topic: "lwt",
                message: "bye",
            }),
            username: Some("user"),
            password: Some("pass"),
        };
        let flags = connect.flags();
        assert_eq!(flags & FLAG_CLEAN_SESSION, 0);
        assert_ne!(flags & FLAG_WILL, 0);
        assert_ne!(flags & FLAG_WILL_RETAIN, 0);
        assert_eq!((flags >> 3) & 0b11, 2);
        assert_ne!(flags & FLAG_USERNAME, 0);
        assert_ne!(flags & FLAG_PASSWORD, 0);
    }

    #[test]
    fn test_connect_return_code_rejects_unknown() {
        assert_eq!(
            ConnectReturnCode::from_u8(0x06),
            Err(PacketError::ProtocolError)
        );
    }
}
