/// A single-producer / single-consumer byte ring used to stage encoded packets before they are
/// handed to the transport.
///
/// The buffer never copies on read: [`Self::linear_read_view`] returns a contiguous slice of
/// whatever is currently queued, and the caller advances the read cursor with [`Self::skip`]
/// once the transport confirms how many of those bytes it actually accepted.
pub struct TxBuffer {
    data: Vec<u8>,
    read: usize,
    write: usize,
    len: usize,
    is_sending: bool,
}

impl TxBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            read: 0,
            write: 0,
            len: 0,
            is_sending: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes of free space available to [`Self::write`].
    pub fn free(&self) -> usize {
        self.capacity() - self.len
    }

    /// Writes as many leading bytes of `bytes` as fit, returning the count written.
    ///
    /// Callers that need atomic, all-or-nothing encodes must check [`Self::free`] first; this
    /// method itself never refuses a partial write.
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.free());
        let capacity = self.capacity();

        for &b in &bytes[..n] {
            self.data[self.write] = b;
            self.write = (self.write + 1) % capacity;
        }
        self.len += n;

        n
    }

    /// A contiguous view of the currently queued bytes, starting at the read cursor.
    ///
    /// When the queued region wraps past the end of the backing storage, only the first
    /// (pre-wrap) segment is returned; the caller sees the rest on a subsequent call after
    /// skipping past this segment.
    pub fn linear_read_view(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }

        let until_end = self.capacity() - self.read;
        let n = self.len.min(until_end);
        &self.data[self.read..self.read + n]
    }

    /// Advances the read cursor by `n` bytes the transport has confirmed accepting.
    pub fn skip(&mut self, n: usize) {
        let n = n.min(self.len);
        self.read = (self.read + n) % self.capacity();
        self.len -= n;
    }

    /// Discards all queued content and realigns the read/write cursors to the start.
    ///
    /// Only safe to call while empty and while no send is in flight; both are asserted.
    pub fn reset(&mut self) {
        debug_assert!(self.len == 0, "reset of a non-empty tx buffer");
        debug_assert!(!self.is_sending, "reset while a send is in flight");
        self.read = 0;
        self.write = 0;
    }

    /// Resets the buffer if it is empty and not mid-send, restoring single-shot contiguous
    /// writes for the next packet. A no-op otherwise.
    pub fn reset_if_idle(&mut self) {
        if self.len == 0 && !self.is_sending {
            self.read = 0;
            self.write = 0;
        }
    }

    pub fn is_sending(&self) -> bool {
        self.is_sending
    }

    pub fn set_sending(&mut self, sending: bool) {
        self.is_sending = sending;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bounded_by_free_space() {
        let mut buf = TxBuffer::new(4);
        assert_eq!(buf.write(b"abcdef"), 4);
        assert_eq!(buf.free(), 0);
    }

    #[test]
    fn test_skip_frees_space_for_more_writes() {
        let mut buf = TxBuffer::new(4);
        buf.write(b"ab");
        buf.skip(2);
        assert_eq!(buf.free(), 4);
        assert_eq!(buf.write(b"cdef"), 4);
    }

    #[test]
    fn test_linear_read_view_wraps_without_copy() {
        let mut buf = TxBuffer::new(4);
        buf.write(b"abcd");
        buf.skip(3);
        // read cursor now at 3, one byte ('d') queued
        assert_eq!(buf.linear_read_view(), b"d");
        assert_eq!(buf.write(b"ef"), 2);
        // 'e' wraps to index 0, 'f' to index 1; linear view only returns up to the wrap point
        assert_eq!(buf.linear_read_view(), b"d");
        buf.skip(1);
        assert_eq!(buf.linear_read_view(), b"ef");
    }

    #[test]
    fn test_reset_if_idle_restores_contiguity() {
        let mut buf = TxBuffer::new(4);
        buf.write(b"abcd");
        buf.skip(4);
        assert!(buf.is_empty());
        buf.reset_if_idle();
        assert_eq!(buf.write(b"xyz"), 3);
        assert_eq!(buf.linear_read_view(), b"xyz");
    }

    #[test]
    fn test_reset_if_idle_noop_while_sending() {
        let mut buf = TxBuffer::new(4);
        buf.write(b"ab");
        buf.skip(2);
        buf.set_sending(true);
        buf.reset_if_idle();
        // read cursor should not have moved back to 0 while sending
        buf.write(b"cd");
        assert_eq!(buf.linear_read_view(), b"cd");
    }
}
