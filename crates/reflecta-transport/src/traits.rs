use crate::error::Result;

/// A byte-oriented, ordered link to the peer.
///
/// Bytes may be corrupted in transit but are never reordered at this
/// boundary. Implementations must not block in [`available`](Self::available)
/// longer than their configured read timeout; the consumption loop is
/// poll-driven and expects to be handed back control.
pub trait Transport {
    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> Result<usize>;

    /// Read one byte.
    ///
    /// Callers should only invoke this after [`available`](Self::available)
    /// reported at least one byte. Returns [`TransportError::Closed`] when no
    /// byte is buffered.
    ///
    /// [`TransportError::Closed`]: crate::TransportError::Closed
    fn read_byte(&mut self) -> Result<u8>;

    /// Write one byte.
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Write a run of bytes.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Push any buffered outgoing bytes onto the link.
    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
