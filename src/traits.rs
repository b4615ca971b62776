/// A destination for raw bytes produced by the encoder.
///
/// The ring transmit buffer is the only implementor in this crate. Writes are
/// assumed to always fit: callers must have reserved space (by checking the tx
/// buffer's free byte count) before encoding.
pub trait Sink {
    fn write_bytes(&mut self, data: &[u8]);
}

/// A type which can be written to a [`Sink`] and knows its own encoded size up front.
///
/// Knowing the size ahead of time lets callers run the "do we have enough memory"
/// check before committing any bytes, keeping every encode atomic.
pub trait Writable {
    /// Returns the amount of bytes [`Self::write_to`] will write when called.
    fn size(&self) -> usize;

    /// Writes bytes to `sink`.
    ///
    /// Implementations must write exactly [`Self::size`] bytes.
    fn write_to<S: Sink>(&self, sink: &mut S);
}

impl<T> Writable for Option<T>
where
    T: Writable,
{
    fn size(&self) -> usize {
        self.as_ref().map_or(0, |w| w.size())
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        if let Some(inner) = self {
            inner.write_to(sink);
        }
    }
}

impl Writable for u8 {
    fn size(&self) -> usize {
        1
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        sink.write_bytes(&[*self]);
    }
}

impl Writable for u16 {
    fn size(&self) -> usize {
        2
    }

    fn write_to<S: Sink>(&self, sink: &mut S) {
        sink.write_bytes(&self.to_be_bytes());
    }
}
