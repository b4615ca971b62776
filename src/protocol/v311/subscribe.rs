use crate::protocol::types::EncodedStr;
use crate::protocol::utils::CursorExt;
use crate::protocol::{Packet, PacketError, PacketParse, ParseError, ParseResult, QoS};
use crate::traits::{Sink, Writable};
use crate::utils::Cursor;

/// A single topic filter and its requested [`QoS`] inside a [`Subscribe`] packet.
#[derive(Debug, Clone, Copy)]
pub struct TopicFilter<'a> {
    pub filter: &'a str,
    pub qos: QoS,
}

impl Writable for TopicFilter<'_> {
    fn size(&self) -> usize {
        EncodedStr(self.filter).size() + 1
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        EncodedStr(self.filter).write_to(sink);
        u8::from(self.qos).write_to(sink);
    }
}

/// A SUBSCRIBE request. The payload contains one or more topic filters; this engine's public
/// API only ever constructs single-filter requests, matching how requests are tracked by a
/// single packet identifier in the request table.
///
/// Spec: MQTT 3.1.1 §3.8.
#[derive(Debug, Clone, Copy)]
pub struct Subscribe<'a> {
    pub packet_id: u16,
    pub filter: TopicFilter<'a>,
}

impl Packet for Subscribe<'_> {
    const TYPE: u8 = 0x08;

    fn flags(&self) -> u8 {
        0b0010
    }
}

impl Writable for Subscribe<'_> {
    fn size(&self) -> usize {
        2 + self.filter.size()
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        self.packet_id.write_to(sink);
        self.filter.write_to(sink);
    }
}

/// An UNSUBSCRIBE request.
///
/// Spec: MQTT 3.1.1 §3.10.
#[derive(Debug, Clone, Copy)]
pub struct Unsubscribe<'a> {
    pub packet_id: u16,
    pub filter: &'a str,
}

impl Packet for Unsubscribe<'_> {
    const TYPE: u8 = 0x0a;

    fn flags(&self) -> u8 {
        0b0010
    }
}

impl Writable for Unsubscribe<'_> {
    fn size(&self) -> usize {
        2 + EncodedStr(self.filter).size()
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        self.packet_id.write_to(sink);
        EncodedStr(self.filter).write_to(sink);
    }
}

/// Per-topic result code returned in a [`SubAck`].
///
/// Spec: MQTT 3.1.1 §3.9.3. Values `0x00..=0x02` grant the listed QoS, `0x80` is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubAckResult {
    Granted(QoS),
    Failure,
}

impl SubAckResult {
    /// Any byte that isn't a granted QoS is a failure, reserved codes included — the server MUST
    /// NOT send anything else, but a malformed or future value still frees the subscribe slot
    /// rather than failing the whole packet.
    pub(crate) fn from_u8(value: u8) -> Self {
        match QoS::try_from(value) {
            Ok(qos) => Self::Granted(qos),
            Err(_) => Self::Failure,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

/// Acknowledgement of a [`Subscribe`] request. This engine's request table is keyed by a single
/// packet identifier, so only the first return code in the payload is surfaced.
///
/// Spec: MQTT 3.1.1 §3.9.
#[derive(Debug)]
pub struct SubAck {
    pub packet_id: u16,
    pub result: SubAckResult,
}

impl Packet for SubAck {
    const TYPE: u8 = 0x09;
}

impl SubAck {
    /// Parses a SUBACK body directly out of `data` (the variable header plus the return code
    /// payload, with no fixed header in front of it). Only the first return code is kept, since
    /// this engine's request table tracks one topic filter per packet identifier.
    pub(crate) fn parse_body(data: &[u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);

        let packet_id = cursor.read_u16_be()?;

        let codes = cursor.read_slice(cursor.remaining())?;
        let first = *codes.first().ok_or(PacketError::ProtocolError)?;
        let result = SubAckResult::from_u8(first);

        Ok((cursor.position(), Self { packet_id, result }))
    }
}

impl<'a> PacketParse<'a> for SubAck {
    fn parse(data: &'a [u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);

        let fixed_header = cursor.read_fixed_header::<Self>()?;

        let body_start = cursor.position();
        let body_len = fixed_header.length().as_u32() as usize;
        let body = data
            .get(body_start..body_start + body_len)
            .ok_or(ParseError::NotEnoughData)?;

        let (_, this) = Self::parse_body(body)?;
        Ok((body_start + body_len, this))
    }
}

/// Acknowledgement of an [`Unsubscribe`] request.
///
/// Spec: MQTT 3.1.1 §3.11.
#[derive(Debug, Clone, Copy)]
pub struct UnsubAck {
    pub packet_id: u16,
}

impl Packet for UnsubAck {
    const TYPE: u8 = 0x0b;
}

impl UnsubAck {
    /// Parses the 2-byte packet id body directly out of `data`, with no fixed header expected
    /// in front of it — the shape inbound dispatch hands over.
    pub(crate) fn parse_body(data: &[u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);
        let packet_id = cursor.read_u16_be()?;
        Ok((cursor.position(), Self { packet_id }))
    }
}

impl<'a> PacketParse<'a> for UnsubAck {
    fn parse(data: &'a [u8]) -> ParseResult<(usize, Self), PacketError> {
        let mut cursor = Cursor::new(data);

        let _fixed_header = cursor.read_fixed_header::<Self>()?;
        let offset = cursor.position();
        let (body_len, this) = Self::parse_body(&data[offset..])?;
        Ok((offset + body_len, this))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suback_result_treats_reserved_values_as_failure() {
        assert_eq!(SubAckResult::from_u8(0x03), SubAckResult::Failure);
        assert_eq!(SubAckResult::from_u8(0x7f), SubAckResult::Failure);
        assert_eq!(SubAckResult::from_u8(0x80), SubAckResult::Failure);
        assert_eq!(
            SubAckResult::from_u8(0x01),
            SubAckResult::Granted(QoS::AtLeastOnce)
        );
    }
}
