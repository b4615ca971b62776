use crate::log;

enum State {
    Init,
    CalcRemLen { header: u8, rem_len: u32, mult: u32 },
    ReadRem { header: u8, rem_len: usize, pos: usize, fits: bool },
}

/// Reassembles MQTT frames out of inbound bytes delivered in arbitrarily sized, arbitrarily
/// split chunks.
///
/// Dispatch happens through the `dispatch` closure passed to [`Self::feed`], invoked once per
/// fully reassembled frame with `(header_byte, payload)` — the payload never includes the fixed
/// header itself. When an entire remaining-length payload is already contiguous within the
/// current chunk, it is dispatched directly out of that chunk without being copied into the rx
/// staging buffer first.
pub struct Parser {
    state: State,
    rx_buf: Vec<u8>,
}

impl Parser {
    pub fn new(rx_capacity: usize) -> Self {
        Self {
            state: State::Init,
            rx_buf: vec![0; rx_capacity],
        }
    }

    pub fn feed(&mut self, chunk: &[u8], mut dispatch: impl FnMut(u8, &[u8])) {
        let mut idx = 0;

        while idx < chunk.len() {
            match &mut self.state {
                State::Init => {
                    let header = chunk[idx];
                    idx += 1;

                    let ty = header >> 4;
                    if !(1..=14).contains(&ty) {
                        log::warn_!("dropping frame with invalid packet type {ty}");
                        continue;
                    }

                    self.state = State::CalcRemLen {
                        header,
                        rem_len: 0,
                        mult: 0,
                    };
                }
                State::CalcRemLen { header, rem_len, mult } => {
                    let byte = chunk[idx];
                    idx += 1;

                    if *mult >= 4 {
                        log::warn_!("remaining length exceeds 4 bytes, dropping frame");
                        self.state = State::Init;
                        continue;
                    }

                    *rem_len |= u32::from(byte & 0x7f) << (7 * *mult);
                    *mult += 1;

                    if byte & 0x80 != 0 {
                        continue;
                    }

                    let header = *header;
                    let rem_len = *rem_len as usize;

                    if rem_len == 0 {
                        dispatch(header, &[]);
                        self.state = State::Init;
                        continue;
                    }

                    let available = chunk.len() - idx;
                    if available >= rem_len {
                        dispatch(header, &chunk[idx..idx + rem_len]);
                        idx += rem_len;
                        self.state = State::Init;
                    } else {
                        let fits = rem_len <= self.rx_buf.len();
                        if fits {
                            self.rx_buf[..available].copy_from_slice(&chunk[idx..]);
                        }
                        idx += available;
                        self.state = State::ReadRem {
                            header,
                            rem_len,
                            pos: available,
                            fits,
                        };
                    }
                }
                State::ReadRem { header, rem_len, pos, fits } => {
                    let byte = chunk[idx];
                    idx += 1;

                    if *fits {
                        self.rx_buf[*pos] = byte;
                    }
                    *pos += 1;

                    if *pos == *rem_len {
                        if *fits {
                            dispatch(*header, &self.rx_buf[..*rem_len]);
                        } else {
                            log::warn_!(
                                "discarding oversized frame of {} bytes (rx buffer holds {})",
                                rem_len,
                                self.rx_buf.len()
                            );
                        }
                        self.state = State::Init;
                    }
                }
            }
        }
    }

    /// Resets to the initial state, discarding any partially reassembled frame.
    pub fn reset(&mut self) {
        self.state = State::Init;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(parser: &mut Parser, chunks: &[&[u8]]) -> Vec<(u8, Vec<u8>)> {
        let mut out = Vec::new();
        for chunk in chunks {
            parser.feed(chunk, |header, payload| out.push((header, payload.to_vec())));
        }
        out
    }

    #[test]
    fn test_whole_frame_in_one_chunk() {
        let mut parser = Parser::new(64);
        let frame = [0x20, 0x02, 0x00, 0x00];
        let out = collect(&mut parser, &[&frame]);
        assert_eq!(out, vec![(0x20, vec![0x00, 0x00])]);
    }

    #[test]
    fn test_frame_split_across_every_byte_boundary() {
        let frame = [0x30, 0x05, 0x00, 0x01, b'a', b'h', b'i'];
        for split in 1..frame.len() {
            let (a, b) = frame.split_at(split);
            let mut parser = Parser::new(64);
            let out = collect(&mut parser, &[a, b]);
            assert_eq!(out, vec![(0x30, vec![0x00, 0x01, b'a', b'h', b'i'])], "split at {split}");
        }
    }

    #[test]
    fn test_two_frames_coalesced_in_one_chunk() {
        let mut parser = Parser::new(64);
        let mut buf = vec![0x20, 0x02, 0x00, 0x00];
        buf.extend_from_slice(&[0xd0, 0x00]); // PINGRESP
        let out = collect(&mut parser, &[&buf]);
        assert_eq!(out, vec![(0x20, vec![0x00, 0x00]), (0xd0, vec![])]);
    }

    #[test]
    fn test_zero_length_frame_dispatches_immediately() {
        let mut parser = Parser::new(64);
        let out = collect(&mut parser, &[&[0xc0, 0x00]]);
        assert_eq!(out, vec![(0xc0, vec![])]);
    }

    #[test]
    fn test_invalid_packet_type_is_dropped_and_recovers() {
        let mut parser = Parser::new(64);
        // type nibble 0 is reserved; parser should skip the byte and keep parsing from the
        // next one, which starts a valid PINGRESP.
        let out = collect(&mut parser, &[&[0x00, 0xd0, 0x00]]);
        assert_eq!(out, vec![(0xd0, vec![])]);
    }

    #[test]
    fn test_oversized_frame_is_discarded_without_corrupting_next_frame() {
        let mut parser = Parser::new(2);
        // Split across chunks so the payload cannot take the zero-copy fast path and must be
        // staged into the (too small) rx buffer instead.
        let header = [0x30u8, 0x05];
        let body = b"abcde";
        let next_frame = [0xd0u8, 0x00];
        let out = collect(&mut parser, &[&header, body, &next_frame]);
        assert_eq!(out, vec![(0xd0, vec![])]);
    }
}
