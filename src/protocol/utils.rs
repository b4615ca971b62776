use crate::protocol::types::FixedHeader;
use crate::protocol::{Packet, PacketError, ParseResult};
use crate::utils::Cursor;

pub trait CursorExt {
    fn read_fixed_header<T>(&mut self) -> ParseResult<FixedHeader, PacketError>
    where
        T: Packet;
}

impl<'a> CursorExt for Cursor<'a> {
    /// Reads a fixed header for a specific packet `T`.
    ///
    /// This utility also validates the read fixed header to match the expected packet.
    fn read_fixed_header<T>(&mut self) -> ParseResult<FixedHeader, PacketError>
    where
        T: Packet,
    {
        let header = self
            .read::<FixedHeader>()
            .map_err(|err| err.map(|_| PacketError::ProtocolError))?;

        if header.ty() != T::TYPE {
            return Err(PacketError::InvalidPacketType { actual: header.ty() }.into());
        }

        Ok(header)
    }
}
