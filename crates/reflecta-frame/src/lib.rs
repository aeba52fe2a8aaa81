//! SLIP-escaped, XOR-checksummed, sequence-numbered framing for serial links.
//!
//! This is the core layer of reflecta. Every frame on the wire is:
//! - A 1-byte sequence number
//! - The payload bytes
//! - A 1-byte XOR checksum over the sequence number and payload
//!
//! each escaped SLIP-style, followed by one raw `0xC0` delimiter.
//!
//! The receiving side is a byte-at-a-time state machine ([`FrameDecoder`])
//! that detects dropped frames, corruption and garbage on the line, reports
//! every violation back to the peer through the [`DiagnosticEmitter`], and
//! resynchronizes on the next delimiter. [`Link`] bundles one transport with
//! one encoder and one decoder.

pub mod buffer;
pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod diagnostic;
pub mod encoder;
pub mod error;
pub mod escape;
pub mod handler;
pub mod link;

pub use buffer::{BufferAllocator, FixedAllocator, FrameBuffer};
pub use checksum::Checksum;
pub use codec::{
    encode_frame, max_encoded_len, Frame, FrameConfig, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_MAX_PAYLOAD,
};
pub use decoder::{
    DecoderState, DecoderStats, DiscardViolations, FrameDecoder, ViolationReporter,
};
pub use diagnostic::{
    Diagnostic, DiagnosticEmitter, FRAMES_ERROR, FRAMES_MESSAGE, FRAMES_WARNING, MAX_MESSAGE_LEN,
};
pub use encoder::FrameEncoder;
pub use error::{FrameError, ProtocolViolation, Result};
pub use escape::{Unescaped, Unescaper, ESCAPE, ESCAPED_END, ESCAPED_ESCAPE, FRAME_END};
pub use handler::{FrameCollector, FrameHandler};
pub use link::Link;
