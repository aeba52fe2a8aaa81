use reflecta_transport::TransportError;

/// Errors that can occur while sending frames or driving a link.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A diagnostic message does not fit in a single frame.
    #[error("diagnostic message too long ({len} bytes, max {max})")]
    MessageTooLong { len: usize, max: usize },

    /// The transport failed while reading or writing.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// A protocol violation detected by the decoder.
///
/// Violations are never fatal. Each one is reported to the peer and the
/// decoder recovers on its own; the only lasting effect is a resynchronized
/// sequence number or one discarded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolViolation {
    /// The frame's sequence number was not the one expected.
    #[error("out of sequence frame (expected {expected:#04x}, received {received:#04x})")]
    OutOfSequence { expected: u8, received: u8 },

    /// The frame did not fit in the allocated buffer.
    #[error("frame exceeds buffer capacity of {capacity} bytes")]
    BufferOverflow { capacity: usize },

    /// The checksum did not cancel out; the frame was dropped.
    #[error("checksum mismatch on frame {sequence:#04x} (residue {residue:#04x})")]
    ChecksumMismatch { sequence: u8, residue: u8 },

    /// A delimiter arrived where no frame was open.
    #[error("unexpected frame delimiter")]
    UnexpectedDelimiter,

    /// An escape marker was followed by something other than a substitute.
    #[error("malformed escape sequence (escape followed by {byte:#04x})")]
    MalformedEscape { byte: u8 },
}

impl ProtocolViolation {
    /// Stable snake_case name for logs and machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolViolation::OutOfSequence { .. } => "out_of_sequence",
            ProtocolViolation::BufferOverflow { .. } => "buffer_overflow",
            ProtocolViolation::ChecksumMismatch { .. } => "checksum_mismatch",
            ProtocolViolation::UnexpectedDelimiter => "unexpected_delimiter",
            ProtocolViolation::MalformedEscape { .. } => "malformed_escape",
        }
    }
}
