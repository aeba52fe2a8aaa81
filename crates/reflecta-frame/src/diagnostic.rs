//! Error, warning and message frames exchanged with the peer.
//!
//! Payload shapes:
//! - `[FRAMES_ERROR, code]`
//! - `[FRAMES_WARNING, code]`
//! - `[FRAMES_MESSAGE, len, text…]`

use reflecta_transport::Transport;
use tracing::debug;

use crate::decoder::ViolationReporter;
use crate::encoder::FrameEncoder;
use crate::error::{FrameError, ProtocolViolation, Result};

/// Payload tag for a free-text message.
pub const FRAMES_MESSAGE: u8 = 0x7D;
/// Payload tag for a warning code.
pub const FRAMES_WARNING: u8 = 0x7E;
/// Payload tag for an error code.
pub const FRAMES_ERROR: u8 = 0x7F;

/// Warning codes carried after [`FRAMES_WARNING`].
pub mod warning_code {
    pub const OUT_OF_SEQUENCE: u8 = 0x00;
    pub const UNEXPECTED_ESCAPE: u8 = 0x01;
    pub const CRC_MISMATCH: u8 = 0x02;
    pub const UNEXPECTED_END: u8 = 0x03;
}

/// Longest message text: the length travels in a single byte.
pub const MAX_MESSAGE_LEN: usize = u8::MAX as usize;

/// Largest diagnostic payload: tag, length and message text.
const MAX_DIAGNOSTIC_PAYLOAD: usize = MAX_MESSAGE_LEN + 2;

/// Error codes carried after [`FRAMES_ERROR`].
pub mod error_code {
    pub const BUFFER_OVERFLOW: u8 = 0x00;
}

/// Human-readable name for a warning code.
pub fn warning_name(code: u8) -> &'static str {
    match code {
        warning_code::OUT_OF_SEQUENCE => "OUT_OF_SEQUENCE",
        warning_code::UNEXPECTED_ESCAPE => "UNEXPECTED_ESCAPE",
        warning_code::CRC_MISMATCH => "CRC_MISMATCH",
        warning_code::UNEXPECTED_END => "UNEXPECTED_END",
        _ => "UNKNOWN",
    }
}

/// Human-readable name for an error code.
pub fn error_name(code: u8) -> &'static str {
    match code {
        error_code::BUFFER_OVERFLOW => "BUFFER_OVERFLOW",
        _ => "UNKNOWN",
    }
}

/// Sends diagnostic frames through an encoder.
///
/// Borrows the encoder for its whole lifetime, so a diagnostic can never be
/// interleaved with another frame being sent.
pub struct DiagnosticEmitter<'a, T: ?Sized> {
    encoder: &'a mut FrameEncoder,
    transport: &'a mut T,
}

impl<'a, T: Transport + ?Sized> DiagnosticEmitter<'a, T> {
    pub fn new(encoder: &'a mut FrameEncoder, transport: &'a mut T) -> Self {
        Self { encoder, transport }
    }

    /// Send `[FRAMES_ERROR, code]`.
    pub fn send_error(&mut self, code: u8) -> Result<u8> {
        self.send(&[FRAMES_ERROR, code])
    }

    /// Send `[FRAMES_WARNING, code]`.
    pub fn send_warning(&mut self, code: u8) -> Result<u8> {
        self.send(&[FRAMES_WARNING, code])
    }

    /// Send `[FRAMES_MESSAGE, len, text…]`.
    ///
    /// Fails with [`FrameError::MessageTooLong`] rather than truncating when
    /// the text does not fit the one-byte length prefix. The encoder's
    /// application payload limit does not apply to diagnostics.
    pub fn send_message(&mut self, text: &str) -> Result<u8> {
        if text.len() > MAX_MESSAGE_LEN {
            return Err(FrameError::MessageTooLong {
                len: text.len(),
                max: MAX_MESSAGE_LEN,
            });
        }

        let mut payload = Vec::with_capacity(text.len() + 2);
        payload.push(FRAMES_MESSAGE);
        payload.push(text.len() as u8);
        payload.extend_from_slice(text.as_bytes());
        self.send(&payload)
    }

    fn send(&mut self, payload: &[u8]) -> Result<u8> {
        self.encoder
            .send_bounded(self.transport, payload, MAX_DIAGNOSTIC_PAYLOAD)
    }
}

impl<T: Transport + ?Sized> ViolationReporter for DiagnosticEmitter<'_, T> {
    fn report(&mut self, violation: ProtocolViolation) -> Result<()> {
        debug!(kind = violation.kind(), "reporting violation to peer");
        match violation {
            ProtocolViolation::OutOfSequence { expected, received } => {
                // The warning goes out even if the message could not.
                let message =
                    self.send_message(&format!("Expected {expected:x} received {received:x}"));
                self.send_warning(warning_code::OUT_OF_SEQUENCE)?;
                message?;
            }
            ProtocolViolation::BufferOverflow { .. } => {
                self.send_error(error_code::BUFFER_OVERFLOW)?;
            }
            ProtocolViolation::ChecksumMismatch { .. } => {
                self.send_warning(warning_code::CRC_MISMATCH)?;
            }
            ProtocolViolation::UnexpectedDelimiter => {
                self.send_warning(warning_code::UNEXPECTED_END)?;
            }
            ProtocolViolation::MalformedEscape { .. } => {
                self.send_warning(warning_code::UNEXPECTED_ESCAPE)?;
            }
        }
        Ok(())
    }
}

/// A diagnostic frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    Error(u8),
    Warning(u8),
    Message(String),
}

impl Diagnostic {
    /// Interpret a frame payload, or `None` if it is not a diagnostic.
    ///
    /// Message text that is not valid UTF-8 is converted lossily.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload {
            [FRAMES_ERROR, code, ..] => Some(Diagnostic::Error(*code)),
            [FRAMES_WARNING, code, ..] => Some(Diagnostic::Warning(*code)),
            [FRAMES_MESSAGE, len, rest @ ..] => {
                let text = rest.get(..*len as usize)?;
                Some(Diagnostic::Message(
                    String::from_utf8_lossy(text).into_owned(),
                ))
            }
            _ => None,
        }
    }

    /// Encode back into a frame payload.
    pub fn to_payload(&self) -> Vec<u8> {
        match self {
            Diagnostic::Error(code) => vec![FRAMES_ERROR, *code],
            Diagnostic::Warning(code) => vec![FRAMES_WARNING, *code],
            Diagnostic::Message(text) => {
                let len = text.len().min(u8::MAX as usize);
                let mut payload = Vec::with_capacity(len + 2);
                payload.push(FRAMES_MESSAGE);
                payload.push(len as u8);
                payload.extend_from_slice(&text.as_bytes()[..len]);
                payload
            }
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::Error(code) => write!(f, "error {} ({code:#04x})", error_name(*code)),
            Diagnostic::Warning(code) => {
                write!(f, "warning {} ({code:#04x})", warning_name(*code))
            }
            Diagnostic::Message(text) => write!(f, "message \"{text}\""),
        }
    }
}
