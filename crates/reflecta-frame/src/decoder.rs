//! Receiving half of the protocol: a byte-at-a-time frame state machine.
//!
//! ```text
//!                  byte (seq)                   delimiter
//! AwaitingSequence ──────────▶ AwaitingByte ─────────────▶ ProcessPayload
//!        ▲  │                    │    ▲ byte                    │
//!        │  │ delimiter          │    └─┘                       │
//!        │  ▼                    │ overflow                     │
//!        │ AwaitingRecovery ◀────┘                              │
//!        │  │  ▲ byte / malformed escape (any state)            │
//!        │  └──┘                                                │
//!        └──────── delimiter ◀── AwaitingRecovery               │
//!        ◀──────────────────────────────────────────────────────┘
//! ```
//!
//! The raw delimiter closes a frame in `AwaitingByte` and marks the
//! resynchronization point in `AwaitingRecovery`; anywhere else it is a
//! violation.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::buffer::{BufferAllocator, FixedAllocator, FrameBuffer};
use crate::checksum::Checksum;
use crate::codec::FrameConfig;
use crate::error::{ProtocolViolation, Result};
use crate::escape::{Unescaped, Unescaper};
use crate::handler::FrameHandler;

/// Decoder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Between frames; the next logical byte is a sequence number.
    AwaitingSequence,
    /// Collecting payload and checksum bytes.
    AwaitingByte,
    /// A frame was closed and is being validated. Transient: the decoder
    /// never rests in this state between bytes.
    ProcessPayload,
    /// Discarding input until the next delimiter.
    AwaitingRecovery,
}

/// Receives violations as the decoder detects them.
///
/// Called after the decoder has completed the transition the violation
/// caused. An error returned here is propagated out of
/// [`FrameDecoder::consume`] without undoing that transition.
pub trait ViolationReporter {
    fn report(&mut self, violation: ProtocolViolation) -> Result<()>;
}

impl ViolationReporter for Vec<ProtocolViolation> {
    fn report(&mut self, violation: ProtocolViolation) -> Result<()> {
        self.push(violation);
        Ok(())
    }
}

/// Reporter that drops every violation (they are still logged and counted).
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardViolations;

impl ViolationReporter for DiscardViolations {
    fn report(&mut self, _violation: ProtocolViolation) -> Result<()> {
        Ok(())
    }
}

/// Running counters kept by a [`FrameDecoder`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Raw bytes fed in, including escapes and delimiters.
    pub bytes_consumed: u64,
    /// Frames handed to the frame handler.
    pub frames_delivered: u64,
    pub out_of_sequence: u64,
    pub buffer_overflows: u64,
    pub checksum_mismatches: u64,
    pub unexpected_delimiters: u64,
    pub malformed_escapes: u64,
}

impl DecoderStats {
    /// Total number of violations of any kind.
    pub fn violations(&self) -> u64 {
        self.out_of_sequence
            + self.buffer_overflows
            + self.checksum_mismatches
            + self.unexpected_delimiters
            + self.malformed_escapes
    }

    fn record(&mut self, violation: &ProtocolViolation) {
        match violation {
            ProtocolViolation::OutOfSequence { .. } => self.out_of_sequence += 1,
            ProtocolViolation::BufferOverflow { .. } => self.buffer_overflows += 1,
            ProtocolViolation::ChecksumMismatch { .. } => self.checksum_mismatches += 1,
            ProtocolViolation::UnexpectedDelimiter => self.unexpected_delimiters += 1,
            ProtocolViolation::MalformedEscape { .. } => self.malformed_escapes += 1,
        }
    }
}

/// Streaming frame decoder.
///
/// Feed it raw bytes in any chunking with [`consume`](Self::consume) or
/// [`feed`](Self::feed). Valid frames go to a [`FrameHandler`]; violations go
/// to a [`ViolationReporter`] and the decoder recovers by itself.
pub struct FrameDecoder<A = FixedAllocator> {
    state: DecoderState,
    unescaper: Unescaper,
    read_checksum: Checksum,
    next_sequence: u8,
    current_sequence: u8,
    allocator: A,
    buffer: Option<FrameBuffer>,
    last_frame_received: Option<Instant>,
    stats: DecoderStats,
}

impl FrameDecoder<FixedAllocator> {
    /// Create a decoder with the default 64-byte fixed buffer.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a decoder whose fixed buffer follows `config.buffer_capacity`.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self::with_allocator(FixedAllocator::new(config.buffer_capacity))
    }
}

impl Default for FrameDecoder<FixedAllocator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: BufferAllocator> FrameDecoder<A> {
    /// Create a decoder drawing receive buffers from `allocator`.
    pub fn with_allocator(allocator: A) -> Self {
        Self {
            state: DecoderState::AwaitingSequence,
            unescaper: Unescaper::new(),
            read_checksum: Checksum::new(),
            next_sequence: 0,
            current_sequence: 0,
            allocator,
            buffer: None,
            last_frame_received: None,
            stats: DecoderStats::default(),
        }
    }

    /// Feed one raw byte from the transport.
    pub fn consume<H, R>(&mut self, raw: u8, handler: &mut H, reporter: &mut R) -> Result<()>
    where
        H: FrameHandler + ?Sized,
        R: ViolationReporter + ?Sized,
    {
        self.stats.bytes_consumed += 1;

        match self.unescaper.push(raw) {
            Unescaped::Pending => Ok(()),
            Unescaped::Byte(byte) => {
                self.read_checksum.fold(byte);
                self.on_byte(byte, reporter)
            }
            Unescaped::Delimiter => self.on_delimiter(handler, reporter),
            Unescaped::Malformed(byte) => {
                self.enter_recovery();
                self.violation(ProtocolViolation::MalformedEscape { byte }, reporter)
            }
        }
    }

    /// Feed a chunk of raw bytes.
    pub fn feed<H, R>(&mut self, bytes: &[u8], handler: &mut H, reporter: &mut R) -> Result<()>
    where
        H: FrameHandler + ?Sized,
        R: ViolationReporter + ?Sized,
    {
        for &raw in bytes {
            self.consume(raw, handler, reporter)?;
        }
        Ok(())
    }

    fn on_byte<R>(&mut self, byte: u8, reporter: &mut R) -> Result<()>
    where
        R: ViolationReporter + ?Sized,
    {
        match self.state {
            DecoderState::AwaitingSequence => self.start_frame(byte, reporter),
            DecoderState::AwaitingByte => {
                let stored = match self.buffer.as_mut() {
                    Some(buffer) => buffer.push(byte),
                    None => false,
                };
                if stored {
                    return Ok(());
                }

                let capacity = self.buffer.as_ref().map_or(0, FrameBuffer::capacity);
                self.read_checksum.reset();
                self.enter_recovery();
                self.violation(ProtocolViolation::BufferOverflow { capacity }, reporter)
            }
            // Nothing to do while discarding. ProcessPayload is never
            // observed here because the delimiter handler leaves it
            // before returning.
            DecoderState::AwaitingRecovery | DecoderState::ProcessPayload => Ok(()),
        }
    }

    fn start_frame<R>(&mut self, sequence: u8, reporter: &mut R) -> Result<()>
    where
        R: ViolationReporter + ?Sized,
    {
        let expected = self.next_sequence;
        self.next_sequence = sequence.wrapping_add(1);

        self.release_buffer();
        let mut buffer = self.allocator.allocate();
        buffer.clear();
        self.buffer = Some(buffer);

        self.current_sequence = sequence;
        self.read_checksum = Checksum::starting_at(sequence);
        self.state = DecoderState::AwaitingByte;

        if sequence != expected {
            return self.violation(
                ProtocolViolation::OutOfSequence {
                    expected,
                    received: sequence,
                },
                reporter,
            );
        }
        Ok(())
    }

    fn on_delimiter<H, R>(&mut self, handler: &mut H, reporter: &mut R) -> Result<()>
    where
        H: FrameHandler + ?Sized,
        R: ViolationReporter + ?Sized,
    {
        match self.state {
            DecoderState::AwaitingByte => {
                self.state = DecoderState::ProcessPayload;
                self.process_payload(handler, reporter)
            }
            DecoderState::AwaitingRecovery => {
                debug!("resynchronized on delimiter");
                self.read_checksum.reset();
                self.state = DecoderState::AwaitingSequence;
                Ok(())
            }
            DecoderState::AwaitingSequence | DecoderState::ProcessPayload => {
                self.enter_recovery();
                self.violation(ProtocolViolation::UnexpectedDelimiter, reporter)
            }
        }
    }

    fn process_payload<H, R>(&mut self, handler: &mut H, reporter: &mut R) -> Result<()>
    where
        H: FrameHandler + ?Sized,
        R: ViolationReporter + ?Sized,
    {
        self.last_frame_received = Some(Instant::now());
        // Checksum failure resumes at AwaitingSequence too: the delimiter that
        // closed the bad frame is already a clean boundary.
        self.state = DecoderState::AwaitingSequence;

        let buffer = self.buffer.take();
        let stored = buffer.as_ref().map_or(0, FrameBuffer::len);

        // A frame needs at least its checksum byte after the sequence number.
        let outcome = match &buffer {
            Some(buffer) if stored > 0 && self.read_checksum.is_valid() => {
                let payload = &buffer.as_slice()[..stored - 1];
                trace!(
                    sequence = self.current_sequence,
                    len = payload.len(),
                    "delivering frame"
                );
                handler.on_frame(self.current_sequence, payload);
                self.stats.frames_delivered += 1;
                None
            }
            _ => Some(ProtocolViolation::ChecksumMismatch {
                sequence: self.current_sequence,
                residue: self.read_checksum.value(),
            }),
        };

        if let Some(buffer) = buffer {
            self.allocator.reclaim(buffer);
        }

        match outcome {
            None => Ok(()),
            Some(violation) => {
                self.read_checksum.reset();
                self.violation(violation, reporter)
            }
        }
    }

    fn enter_recovery(&mut self) {
        self.state = DecoderState::AwaitingRecovery;
        self.release_buffer();
    }

    fn release_buffer(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.allocator.reclaim(buffer);
        }
    }

    fn violation<R>(&mut self, violation: ProtocolViolation, reporter: &mut R) -> Result<()>
    where
        R: ViolationReporter + ?Sized,
    {
        warn!(
            kind = violation.kind(),
            state = ?self.state,
            "{violation}"
        );
        self.stats.record(&violation);
        reporter.report(violation)
    }

    /// Expect the next frame to carry sequence number zero.
    pub fn reset_sequence(&mut self) {
        self.next_sequence = 0;
    }

    /// Current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Sequence number the next frame is expected to carry.
    pub fn next_expected_sequence(&self) -> u8 {
        self.next_sequence
    }

    /// When the last frame (valid or not) was closed by a delimiter.
    pub fn last_frame_received(&self) -> Option<Instant> {
        self.last_frame_received
    }

    pub fn stats(&self) -> &DecoderStats {
        &self.stats
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }
}

impl<A> std::fmt::Debug for FrameDecoder<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("state", &self.state)
            .field("next_sequence", &self.next_sequence)
            .field("stats", &self.stats)
            .finish()
    }
}
