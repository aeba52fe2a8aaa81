//! SLIP byte stuffing (RFC 1055 control values).

use bytes::{BufMut, BytesMut};

/// Frame delimiter. Always sent raw.
pub const FRAME_END: u8 = 0xC0;

/// Escape marker.
pub const ESCAPE: u8 = 0xDB;

/// Follows [`ESCAPE`] to stand for a literal [`FRAME_END`].
pub const ESCAPED_END: u8 = 0xDC;

/// Follows [`ESCAPE`] to stand for a literal [`ESCAPE`].
pub const ESCAPED_ESCAPE: u8 = 0xDD;

/// Append the escaped form of one logical byte.
#[inline]
pub fn escape_into(byte: u8, dst: &mut BytesMut) {
    match byte {
        FRAME_END => {
            dst.put_u8(ESCAPE);
            dst.put_u8(ESCAPED_END);
        }
        ESCAPE => {
            dst.put_u8(ESCAPE);
            dst.put_u8(ESCAPED_ESCAPE);
        }
        other => dst.put_u8(other),
    }
}

/// Number of wire bytes one logical byte occupies.
#[inline]
pub fn escaped_len(byte: u8) -> usize {
    match byte {
        FRAME_END | ESCAPE => 2,
        _ => 1,
    }
}

/// Result of feeding one raw byte to an [`Unescaper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unescaped {
    /// A logical byte, either passed through or de-escaped.
    Byte(u8),
    /// An escape marker was consumed; the logical byte follows.
    Pending,
    /// A raw frame delimiter.
    Delimiter,
    /// The escape marker was followed by this unrecognized byte.
    Malformed(u8),
}

/// Decode-side half of the escaper.
#[derive(Debug, Clone, Default)]
pub struct Unescaper {
    escaped: bool,
}

impl Unescaper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw byte.
    pub fn push(&mut self, raw: u8) -> Unescaped {
        if self.escaped {
            self.escaped = false;
            return match raw {
                ESCAPED_END => Unescaped::Byte(FRAME_END),
                ESCAPED_ESCAPE => Unescaped::Byte(ESCAPE),
                other => Unescaped::Malformed(other),
            };
        }

        match raw {
            ESCAPE => {
                self.escaped = true;
                Unescaped::Pending
            }
            FRAME_END => Unescaped::Delimiter,
            other => Unescaped::Byte(other),
        }
    }

    /// True between an escape marker and the byte that completes it.
    pub fn is_escaped(&self) -> bool {
        self.escaped
    }
}
