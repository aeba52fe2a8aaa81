//! Sequence-numbered, checksummed framing over serial links.
//!
//! reflecta exchanges small binary messages with a microcontroller over a
//! byte-oriented link. Frames are SLIP-escaped, carry a wrapping sequence
//! number and an XOR checksum, and every protocol violation is reported back
//! to the peer as a diagnostic frame.
//!
//! # Crate Structure
//!
//! - [`transport`]: the byte-stream [`Transport`](transport::Transport) trait,
//!   in-memory and stream adapters, and the serial device opener
//! - [`frame`]: escaping, checksums, the frame encoder and decoder, diagnostics
//!   and the [`Link`](frame::Link) wrapper
//!
//! # Example
//!
//! ```
//! use reflecta::frame::{FrameCollector, Link};
//! use reflecta::transport::MemoryTransport;
//!
//! let mut host = Link::new(MemoryTransport::new());
//! host.send(b"ping").unwrap();
//!
//! let wire = host.get_mut().take_outgoing();
//! let mut device = Link::new(MemoryTransport::with_incoming(&wire));
//! let mut frames = FrameCollector::new();
//! assert_eq!(device.poll(&mut frames).unwrap(), 1);
//! assert_eq!(frames.frames()[0].payload.as_ref(), b"ping");
//! ```

/// Re-export transport types.
pub mod transport {
    pub use reflecta_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use reflecta_frame::*;
}
