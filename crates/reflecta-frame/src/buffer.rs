//! Receive buffers and the allocation collaborator.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::codec::DEFAULT_BUFFER_CAPACITY;

/// A bounded receive buffer for one frame.
///
/// Holds the de-escaped payload followed by the checksum byte. Capacity is
/// fixed when the buffer is handed out and never grows.
#[derive(Debug)]
pub struct FrameBuffer {
    bytes: BytesMut,
    capacity: usize,
}

impl FrameBuffer {
    /// Allocate a fresh buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    /// Reuse existing storage, bounded to `capacity` bytes.
    pub fn from_bytes(mut bytes: BytesMut, capacity: usize) -> Self {
        bytes.clear();
        bytes.reserve(capacity);
        Self { bytes, capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.bytes.len() >= self.capacity
    }

    /// Append a byte. Returns `false` (and stores nothing) when full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.bytes.put_u8(byte);
        true
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Give back the underlying storage.
    pub fn into_inner(self) -> BytesMut {
        self.bytes
    }
}

/// Supplies receive buffers to the decoder.
///
/// [`allocate`](Self::allocate) is called once per incoming frame, when its
/// sequence number arrives. The decoder owns the buffer while the frame is
/// assembled, lends it read-only to the frame handler, and passes it to
/// [`reclaim`](Self::reclaim) once the handler has returned or the frame was
/// discarded. A buffer is never written again after it was handed to the
/// handler until it has gone back through `reclaim`.
pub trait BufferAllocator {
    /// Hand out an empty buffer for the next frame.
    fn allocate(&mut self) -> FrameBuffer;

    /// Take back a buffer the decoder is done with.
    fn reclaim(&mut self, buffer: FrameBuffer) {
        let _ = buffer;
    }
}

impl<F: FnMut() -> FrameBuffer> BufferAllocator for F {
    fn allocate(&mut self) -> FrameBuffer {
        self()
    }
}

/// Default allocator: a single fixed-size region reused for every frame.
#[derive(Debug)]
pub struct FixedAllocator {
    capacity: usize,
    spare: Option<BytesMut>,
}

impl FixedAllocator {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            spare: Some(BytesMut::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for FixedAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl BufferAllocator for FixedAllocator {
    fn allocate(&mut self) -> FrameBuffer {
        match self.spare.take() {
            Some(bytes) => FrameBuffer::from_bytes(bytes, self.capacity),
            None => {
                trace!(capacity = self.capacity, "fixed buffer still lent out, allocating");
                FrameBuffer::with_capacity(self.capacity)
            }
        }
    }

    fn reclaim(&mut self, buffer: FrameBuffer) {
        self.spare = Some(buffer.into_inner());
    }
}
