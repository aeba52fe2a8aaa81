use bytes::{BufMut, Bytes, BytesMut};

use crate::checksum::Checksum;
use crate::escape::{escape_into, escaped_len, FRAME_END};

/// Default largest payload the encoder accepts.
///
/// Leaves room for the sequence and checksum bytes inside a 255-byte logical
/// frame, matching peers that count frame lengths in a single byte.
pub const DEFAULT_MAX_PAYLOAD: usize = 253;

/// Default receive buffer size handed out by [`FixedAllocator`].
///
/// The buffer holds the payload and the trailing checksum byte.
///
/// [`FixedAllocator`]: crate::buffer::FixedAllocator
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

/// A received frame, detached from the decoder's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sequence number assigned by the sender.
    pub sequence: u8,
    /// The frame payload, checksum excluded.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(sequence: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            sequence,
            payload: payload.into(),
        }
    }

    /// The number of bytes this frame occupies on the wire.
    pub fn wire_size(&self) -> usize {
        let checksum = Checksum::of_frame(self.sequence, &self.payload);
        escaped_len(self.sequence)
            + self.payload.iter().map(|&b| escaped_len(b)).sum::<usize>()
            + escaped_len(checksum)
            + 1
    }
}

/// Encode a frame into the wire format, returning the checksum byte.
///
/// Wire format:
/// ```text
/// ┌──────────────┬───────────────────┬──────────────┬───────────┐
/// │ Sequence     │ Payload           │ Checksum     │ Delimiter │
/// │ (1B, escaped)│ (N bytes, escaped)│ (1B, escaped)│ 0xC0 raw  │
/// └──────────────┴───────────────────┴──────────────┴───────────┘
/// ```
///
/// The checksum is the XOR of the sequence number and every payload byte,
/// computed over unescaped values.
pub fn encode_frame(sequence: u8, payload: &[u8], dst: &mut BytesMut) -> u8 {
    dst.reserve(max_encoded_len(payload.len()));

    let mut checksum = Checksum::new();
    checksum.fold(sequence);
    escape_into(sequence, dst);
    for &b in payload {
        checksum.fold(b);
        escape_into(b, dst);
    }

    let checksum = checksum.value();
    escape_into(checksum, dst);
    dst.put_u8(FRAME_END);
    checksum
}

/// Upper bound on the encoded size of a payload of `payload_len` bytes.
pub fn max_encoded_len(payload_len: usize) -> usize {
    2 * (payload_len + 2) + 1
}

/// Configuration for encoders, decoders and links.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Receive buffer capacity (payload plus checksum byte). Default: 64.
    pub buffer_capacity: usize,
    /// Maximum payload size accepted for sending. Default: 253.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{ESCAPE, ESCAPED_END, ESCAPED_ESCAPE};

    #[test]
    fn encodes_reference_frame() {
        let mut buf = BytesMut::new();
        let chk = encode_frame(5, &[0x01, 0xC0, 0x02], &mut buf);

        assert_eq!(chk, 5 ^ 0x01 ^ 0xC0 ^ 0x02);
        assert_eq!(buf.as_ref(), &[0x05, 0x01, 0xDB, 0xDC, 0x02, chk, 0xC0]);
    }

    #[test]
    fn empty_payload_is_sequence_checksum_delimiter() {
        let mut buf = BytesMut::new();
        let chk = encode_frame(9, &[], &mut buf);
        assert_eq!(chk, 9);
        assert_eq!(buf.as_ref(), &[9, 9, FRAME_END]);
    }

    #[test]
    fn reserved_sequence_and_checksum_are_escaped() {
        let mut buf = BytesMut::new();
        // sequence 0xC0 with payload 0x1B gives checksum 0xDB.
        let chk = encode_frame(FRAME_END, &[0x1B], &mut buf);
        assert_eq!(chk, ESCAPE);
        assert_eq!(
            buf.as_ref(),
            &[ESCAPE, ESCAPED_END, 0x1B, ESCAPE, ESCAPED_ESCAPE, FRAME_END]
        );
    }

    #[test]
    fn delimiter_only_appears_at_end() {
        let payload: Vec<u8> = (0..=u8::MAX).collect();
        let mut buf = BytesMut::new();
        encode_frame(FRAME_END, &payload, &mut buf);

        let delimiters = buf.iter().filter(|&&b| b == FRAME_END).count();
        assert_eq!(delimiters, 1);
        assert_eq!(buf.last(), Some(&FRAME_END));
        assert!(buf.len() <= max_encoded_len(payload.len()));
    }

    #[test]
    fn multiple_frames_append() {
        let mut buf = BytesMut::new();
        encode_frame(0, b"first", &mut buf);
        let first = buf.len();
        encode_frame(1, b"second", &mut buf);
        assert_eq!(buf[first - 1], FRAME_END);
        assert_eq!(buf[first], 1);
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(1, Bytes::from_static(&[0xC0, 0x00]));
        let mut buf = BytesMut::new();
        encode_frame(frame.sequence, &frame.payload, &mut buf);
        assert_eq!(frame.wire_size(), buf.len());
    }

    #[test]
    fn default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.buffer_capacity, 64);
        assert_eq!(cfg.max_payload_size, 253);
    }
}
