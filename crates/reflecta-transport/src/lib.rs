//! Byte-stream transport abstraction for serial framing.
//!
//! The framing layer only ever needs four operations from the link it runs
//! over: how many bytes are ready, read one, write one, flush. This crate
//! provides that interface as the [`Transport`] trait together with:
//! - [`MemoryTransport`]: an in-memory link for tests and offline decoding
//! - [`StreamTransport`]: an adapter over any `Read + Write` stream
//! - [`SerialPort`]: a raw-mode serial device opener (unix)
//!
//! This is the lowest layer of reflecta. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod serial;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use stream::StreamTransport;
pub use traits::Transport;

#[cfg(unix)]
pub use serial::{SerialConfig, SerialPort, DEFAULT_BAUD_RATE};
