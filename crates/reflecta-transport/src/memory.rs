use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// In-memory transport.
///
/// Incoming bytes are queued with [`push_incoming`](Self::push_incoming) and
/// everything written is collected until [`take_outgoing`](Self::take_outgoing).
/// Flushing is a no-op apart from counting calls.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    incoming: BytesMut,
    outgoing: BytesMut,
    flushes: usize,
}

impl MemoryTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport with `bytes` already queued for reading.
    pub fn with_incoming(bytes: &[u8]) -> Self {
        let mut transport = Self::new();
        transport.push_incoming(bytes);
        transport
    }

    /// Queue bytes as if they had arrived from the peer.
    pub fn push_incoming(&mut self, bytes: &[u8]) {
        self.incoming.extend_from_slice(bytes);
    }

    /// Drain everything written so far.
    pub fn take_outgoing(&mut self) -> Bytes {
        self.outgoing.split().freeze()
    }

    /// Bytes written and not yet taken.
    pub fn outgoing(&self) -> &[u8] {
        &self.outgoing
    }

    /// Number of times [`Transport::flush`] has been called.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }
}

impl Transport for MemoryTransport {
    fn available(&mut self) -> Result<usize> {
        Ok(self.incoming.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if !self.incoming.has_remaining() {
            return Err(TransportError::Closed);
        }
        Ok(self.incoming.get_u8())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.outgoing.put_u8(byte);
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.outgoing.put_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}
