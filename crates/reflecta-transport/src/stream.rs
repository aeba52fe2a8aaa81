use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Pause between write attempts while a non-blocking descriptor is full.
const WRITE_RETRY_DELAY: Duration = Duration::from_millis(1);

const READ_CHUNK_SIZE: usize = 256;
const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Adapts any `Read + Write` stream to the [`Transport`] interface.
///
/// Reads are pulled from the stream in chunks when the local buffer runs dry.
/// A read that times out, would block, or returns zero bytes is reported as
/// "nothing available" rather than an error, which matches serial devices
/// configured with an inter-byte timeout. Writes are buffered until
/// [`flush`](Transport::flush).
pub struct StreamTransport<T> {
    inner: T,
    rx: BytesMut,
    tx: BytesMut,
}

impl<T: Read + Write> StreamTransport<T> {
    /// Wrap a stream.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            rx: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            tx: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.rx.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Ok(0)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the transport and return the inner stream.
    ///
    /// Unflushed outgoing bytes and unread incoming bytes are dropped.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> Transport for StreamTransport<T> {
    fn available(&mut self) -> Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.rx.is_empty() && self.fill()? == 0 {
            return Err(TransportError::Closed);
        }
        Ok(self.rx.get_u8())
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.tx.put_u8(byte);
        Ok(())
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.tx.put_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        while !self.tx.is_empty() {
            match self.inner.write(&self.tx) {
                Ok(0) => return Err(TransportError::Closed),
                Ok(n) => self.tx.advance(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => wait_writable(),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => wait_writable(),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

/// Back off before retrying a write the descriptor refused.
fn wait_writable() {
    std::thread::sleep(WRITE_RETRY_DELAY);
}

impl<T> std::fmt::Debug for StreamTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("buffered_in", &self.rx.len())
            .field("buffered_out", &self.tx.len())
            .finish()
    }
}
