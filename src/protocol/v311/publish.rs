use core::fmt;

use crate::protocol::types::EncodedStr;
use crate::protocol::utils::CursorExt;
use crate::protocol::{Packet, PacketError, ParseError, Parse, ParseResult, QoS};
use crate::traits::{Sink, Writable};
use crate::utils::Cursor;

/// A PUBLISH packet, carrying application data either to or from the server.
///
/// Spec: MQTT 3.1.1 §3.3.
pub struct Publish<'a> {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    pub packet_id: Option<u16>,
    pub topic: &'a str,
    pub payload: &'a [u8],
}

impl fmt::Debug for Publish<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Publish {{ Q{} D{} R{} id:{:?} {:?}: {} bytes }}",
            self.qos as u8, self.dup as u8, self.retain as u8, self.packet_id, self.topic, self.payload.len()
        )
    }
}

impl Packet for Publish<'_> {
    const TYPE: u8 = 0x03;

    fn flags(&self) -> u8 {
        (self.dup as u8) << 3 | (u8::from(self.qos)) << 1 | self.retain as u8
    }
}

impl<'a> Publish<'a> {
    /// Parses the variable header and payload of a PUBLISH directly out of `data`, given the
    /// flags nibble off the fixed header byte. `data` must hold exactly this packet's body and
    /// nothing past it, which is exactly what the parser's zero-copy `(header, payload)` split
    /// hands to inbound dispatch — so this is callable there with no frame reconstruction.
    pub(crate) fn parse_body(flags: u8, data: &'a [u8]) -> Result<(usize, Self), ParseError<PacketError>> {
        let mut cursor = Cursor::new(data);

        let dup = flags & 0b1000 > 0;
        let qos = QoS::try_from((flags >> 1) & 0b11).map_err(|_| PacketError::ProtocolError)?;
        let retain = flags & 0b0001 > 0;

        let EncodedStr(topic) = cursor.read()?;

        let packet_id = match qos {
            QoS::AtMostOnce => None,
            _ => Some(cursor.read_u16_be()?),
        };

        let payload = cursor.read_slice(cursor.remaining())?;

        Ok((
            cursor.position(),
            Self {
                dup,
                qos,
                retain,
                packet_id,
                topic,
                payload,
            },
        ))
    }
}

impl<'a> Parse<'a> for Publish<'a> {
    type Error = PacketError;

    fn parse(data: &'a [u8]) -> Result<(usize, Self), ParseError<Self::Error>> {
        let mut cursor = Cursor::new(data);

        let fixed_header = cursor.read_fixed_header::<Self>()?;

        let body_start = cursor.position();
        let body_len = fixed_header.length().as_u32() as usize;
        let body = data
            .get(body_start..body_start + body_len)
            .ok_or(ParseError::NotEnoughData)?;

        let (_, this) = Self::parse_body(fixed_header.flags(), body)?;
        Ok((body_start + body_len, this))
    }
}

impl Writable for Publish<'_> {
    fn size(&self) -> usize {
        EncodedStr(self.topic).size() + self.packet_id.size() + self.payload.len()
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        EncodedStr(self.topic).write_to(sink);
        self.packet_id.write_to(sink);
        sink.write_bytes(self.payload);
    }
}

/// Acknowledgement packets that only carry a 2-byte packet identifier: PUBACK, PUBREC, PUBREL
/// and PUBCOMP, plus SUBACK/UNSUBACK share the same wire shape for their identifier prefix.
///
/// Spec: MQTT 3.1.1 §3.4, §3.5, §3.6, §3.7.
macro_rules! packet_id_ack {
    ($name:ident, $ty:expr, $flags:expr) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            pub packet_id: u16,
        }

        impl Packet for $name {
            const TYPE: u8 = $ty;

            fn flags(&self) -> u8 {
                $flags
            }
        }

        impl Writable for $name {
            fn size(&self) -> usize {
                2
            }

            fn write_to<S: Sink>(&self, sink: &mut S) {
                self.packet_id.write_to(sink);
            }
        }

        impl $name {
            /// Parses the 2-byte packet id body directly out of `data`, with no fixed header
            /// expected in front of it — the shape inbound dispatch hands over.
            pub(crate) fn parse_body(data: &[u8]) -> ParseResult<(usize, Self), PacketError> {
                let mut cursor = Cursor::new(data);
                let packet_id = cursor.read_u16_be()?;
                Ok((cursor.position(), Self { packet_id }))
            }
        }

        impl<'a> crate::protocol::PacketParse<'a> for $name {
            fn parse(data: &'a [u8]) -> ParseResult<(usize, Self), PacketError> {
                let mut cursor = Cursor::new(data);

                let _fixed_header = cursor.read_fixed_header::<Self>()?;
                let offset = cursor.position();
                let (body_len, this) = Self::parse_body(&data[offset..])?;
                Ok((offset + body_len, this))
            }
        }
    };
}

packet_id_ack!(PubAck, 0x04, 0);
packet_id_ack!(PubRec, 0x05, 0);
// PUBREL is the one packet id acknowledgement with mandatory QoS-1-shaped flags (0b0010).
packet_id_ack!(PubRel, 0x06, 0b0010);
packet_id_ack!(PubComp, 0x07, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_flags_encode_dup_qos_retain() {
        let publish = Publish {
            dup: true,
            qos: QoS::ExactlyOnce,
            retain: true,
            packet_id: Some(7),
            topic: "a/b",
            payload: b"x",
        };
        assert_eq!(publish.flags(), 0b1101);
    }

    #[test]
    fn test_pubrel_has_fixed_qos1_flags() {
        let pubrel = PubRel { packet_id: 1 };
        assert_eq!(pubrel.flags(), 0b0010);
        assert_eq!(PubAck { packet_id: 1 }.flags(), 0);
    }
}
