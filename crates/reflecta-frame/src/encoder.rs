use bytes::BytesMut;
use reflecta_transport::Transport;
use tracing::trace;

use crate::codec::{encode_frame, max_encoded_len, FrameConfig};
use crate::error::{FrameError, Result};

/// Sending half of the protocol.
///
/// Owns the outgoing sequence counter. Not reentrant: one `send_frame` call
/// must complete before the next begins, including calls made on behalf of
/// diagnostics.
#[derive(Debug)]
pub struct FrameEncoder {
    write_sequence: u8,
    max_payload_size: usize,
    scratch: BytesMut,
}

impl FrameEncoder {
    /// Create an encoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create an encoder with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            write_sequence: 0,
            max_payload_size: config.max_payload_size,
            scratch: BytesMut::with_capacity(max_encoded_len(config.max_payload_size)),
        }
    }

    /// Encode `payload` and write it to `transport`, returning the sequence
    /// number it was sent with.
    ///
    /// The sequence counter advances (wrapping) once the frame has been
    /// handed to the transport, even if the transport then fails: part of the
    /// frame may already be on the wire.
    pub fn send_frame<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &[u8],
    ) -> Result<u8> {
        self.send_bounded(transport, payload, self.max_payload_size)
    }

    /// Like [`send_frame`](Self::send_frame) but with an explicit ceiling.
    ///
    /// Diagnostic frames are bounded by their own length prefix, not by the
    /// application payload limit.
    pub(crate) fn send_bounded<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        payload: &[u8],
        max: usize,
    ) -> Result<u8> {
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            });
        }

        let sequence = self.write_sequence;
        self.write_sequence = sequence.wrapping_add(1);

        self.scratch.clear();
        let checksum = encode_frame(sequence, payload, &mut self.scratch);

        transport.write_all(&self.scratch)?;
        transport.flush()?;

        trace!(
            sequence,
            checksum,
            len = payload.len(),
            wire_len = self.scratch.len(),
            "sent frame"
        );
        Ok(sequence)
    }

    /// Sequence number the next frame will carry.
    pub fn next_sequence(&self) -> u8 {
        self.write_sequence
    }

    /// Largest payload [`send_frame`](Self::send_frame) accepts.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Restart outgoing numbering at zero.
    pub fn reset(&mut self) {
        self.write_sequence = 0;
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}
