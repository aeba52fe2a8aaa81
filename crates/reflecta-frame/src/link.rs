use reflecta_transport::Transport;
use tracing::debug;

use crate::buffer::{BufferAllocator, FixedAllocator};
use crate::codec::FrameConfig;
use crate::decoder::FrameDecoder;
use crate::diagnostic::DiagnosticEmitter;
use crate::encoder::FrameEncoder;
use crate::error::Result;
use crate::handler::FrameHandler;

/// One end of a framed link: a transport plus its encoder and decoder.
///
/// Single-threaded and poll-driven. Call [`poll`](Self::poll) from the
/// application's loop; violations the decoder detects are reported to the
/// peer through the same encoder used by [`send`](Self::send).
pub struct Link<T, A = FixedAllocator> {
    transport: T,
    encoder: FrameEncoder,
    decoder: FrameDecoder<A>,
}

impl<T: Transport> Link<T> {
    /// Create a link with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &FrameConfig::default())
    }

    /// Create a link with explicit configuration.
    pub fn with_config(transport: T, config: &FrameConfig) -> Self {
        Self {
            transport,
            encoder: FrameEncoder::with_config(config),
            decoder: FrameDecoder::with_config(config),
        }
    }
}

impl<T: Transport, A: BufferAllocator> Link<T, A> {
    /// Create a link whose decoder draws buffers from `allocator`.
    pub fn with_allocator(transport: T, config: &FrameConfig, allocator: A) -> Self {
        Self {
            transport,
            encoder: FrameEncoder::with_config(config),
            decoder: FrameDecoder::with_allocator(allocator),
        }
    }

    /// Send a payload, returning the sequence number used.
    pub fn send(&mut self, payload: &[u8]) -> Result<u8> {
        self.encoder.send_frame(&mut self.transport, payload)
    }

    /// Send an error diagnostic.
    pub fn send_error(&mut self, code: u8) -> Result<u8> {
        self.emitter().send_error(code)
    }

    /// Send a warning diagnostic.
    pub fn send_warning(&mut self, code: u8) -> Result<u8> {
        self.emitter().send_warning(code)
    }

    /// Send a text message diagnostic.
    pub fn send_message(&mut self, text: &str) -> Result<u8> {
        self.emitter().send_message(text)
    }

    fn emitter(&mut self) -> DiagnosticEmitter<'_, T> {
        DiagnosticEmitter::new(&mut self.encoder, &mut self.transport)
    }

    /// Consume every byte currently available, returning the number of
    /// frames delivered to `handler`.
    pub fn poll<H: FrameHandler + ?Sized>(&mut self, handler: &mut H) -> Result<usize> {
        let before = self.decoder.stats().frames_delivered;

        while self.transport.available()? > 0 {
            let byte = self.transport.read_byte()?;
            let mut emitter = DiagnosticEmitter::new(&mut self.encoder, &mut self.transport);
            self.decoder.consume(byte, handler, &mut emitter)?;
        }

        Ok((self.decoder.stats().frames_delivered - before) as usize)
    }

    /// Restart sequence numbering in both directions and flush the transport.
    pub fn reset(&mut self) -> Result<()> {
        debug!("resetting link sequence numbers");
        self.encoder.reset();
        self.decoder.reset_sequence();
        self.transport.flush()?;
        Ok(())
    }

    pub fn encoder(&self) -> &FrameEncoder {
        &self.encoder
    }

    pub fn decoder(&self) -> &FrameDecoder<A> {
        &self.decoder
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the link and return the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: std::fmt::Debug, A> std::fmt::Debug for Link<T, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("transport", &self.transport)
            .field("encoder", &self.encoder)
            .field("decoder", &self.decoder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use reflecta_transport::MemoryTransport;

    use super::*;
    use crate::codec::Frame;
    use crate::diagnostic::{warning_code, Diagnostic};
    use crate::error::FrameError;
    use crate::handler::FrameCollector;

    /// Move everything `from` sent into `to`'s receive queue.
    fn pump(from: &mut Link<MemoryTransport>, to: &mut Link<MemoryTransport>) {
        let bytes = from.get_mut().take_outgoing();
        to.get_mut().push_incoming(&bytes);
    }

    #[test]
    fn roundtrip_between_two_links() {
        let mut host = Link::new(MemoryTransport::new());
        let mut device = Link::new(MemoryTransport::new());

        assert_eq!(host.send(b"ping").unwrap(), 0);
        assert_eq!(host.send(&[0xC0, 0xDB]).unwrap(), 1);
        pump(&mut host, &mut device);

        let mut frames = FrameCollector::new();
        assert_eq!(device.poll(&mut frames).unwrap(), 2);
        assert_eq!(
            frames.drain(),
            vec![Frame::new(0, b"ping".to_vec()), Frame::new(1, vec![0xC0, 0xDB])]
        );
        assert!(device.get_ref().outgoing().is_empty());
    }

    #[test]
    fn violations_are_reported_to_peer() {
        let mut host = Link::new(MemoryTransport::new());
        let mut device = Link::new(MemoryTransport::new());

        host.send(b"zero").unwrap();
        host.send(b"one").unwrap();
        // drop frame 0 on the floor
        let wire = host.get_mut().take_outgoing();
        let first_end = wire.iter().position(|&b| b == 0xC0).unwrap();
        device.get_mut().push_incoming(&wire[first_end + 1..]);

        let mut frames = FrameCollector::new();
        assert_eq!(device.poll(&mut frames).unwrap(), 1);
        pump(&mut device, &mut host);

        let mut reports = FrameCollector::new();
        host.poll(&mut reports).unwrap();
        let diagnostics: Vec<Diagnostic> = reports
            .drain()
            .iter()
            .filter_map(|f| Diagnostic::parse(&f.payload))
            .collect();
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::Message("Expected 0 received 1".to_string()),
                Diagnostic::Warning(warning_code::OUT_OF_SEQUENCE),
            ]
        );
    }

    #[test]
    fn small_payload_limit_does_not_block_violation_reports() {
        let cfg = FrameConfig {
            max_payload_size: 8,
            ..FrameConfig::default()
        };
        let mut host = Link::with_config(MemoryTransport::new(), &cfg);
        let mut device = Link::with_config(MemoryTransport::new(), &cfg);

        host.send(b"zero").unwrap();
        host.send(b"one").unwrap();
        host.send(b"two").unwrap();
        let wire = host.get_mut().take_outgoing();
        let first_end = wire.iter().position(|&b| b == 0xC0).unwrap();
        device.get_mut().push_incoming(&wire[first_end + 1..]);

        let mut frames = FrameCollector::new();
        assert_eq!(device.poll(&mut frames).unwrap(), 2);
        assert_eq!(device.get_mut().available().unwrap(), 0);
        pump(&mut device, &mut host);

        let mut reports = FrameCollector::new();
        host.poll(&mut reports).unwrap();
        let diagnostics: Vec<Diagnostic> = reports
            .drain()
            .iter()
            .filter_map(|f| Diagnostic::parse(&f.payload))
            .collect();
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::Message("Expected 0 received 1".to_string()),
                Diagnostic::Warning(warning_code::OUT_OF_SEQUENCE),
            ]
        );
    }

    #[test]
    fn poll_without_data_delivers_nothing() {
        let mut link = Link::new(MemoryTransport::new());
        let mut frames = FrameCollector::new();
        assert_eq!(link.poll(&mut frames).unwrap(), 0);
    }

    #[test]
    fn reset_restarts_both_directions() {
        let mut host = Link::new(MemoryTransport::new());
        let mut device = Link::new(MemoryTransport::new());
        host.send(b"a").unwrap();
        pump(&mut host, &mut device);
        device.poll(&mut FrameCollector::new()).unwrap();
        device.send(b"b").unwrap();

        host.reset().unwrap();
        device.reset().unwrap();
        device.get_mut().take_outgoing();

        assert_eq!(host.encoder().next_sequence(), 0);
        assert_eq!(device.encoder().next_sequence(), 0);
        assert_eq!(device.decoder().next_expected_sequence(), 0);
        assert!(host.get_ref().flush_count() > 0);

        host.send(b"c").unwrap();
        pump(&mut host, &mut device);
        device.poll(&mut FrameCollector::new()).unwrap();
        assert_eq!(device.decoder().stats().violations(), 0);
    }

    #[test]
    fn diagnostic_helpers_send_frames() {
        let mut link = Link::new(MemoryTransport::new());
        link.send_error(0).unwrap();
        link.send_warning(warning_code::CRC_MISMATCH).unwrap();
        assert_eq!(link.send_message("hello").unwrap(), 2);

        let err = link.send_message(&"x".repeat(300)).unwrap_err();
        assert!(matches!(err, FrameError::MessageTooLong { .. }));
    }

    #[test]
    fn closure_handler_sees_borrowed_payload() {
        let mut host = Link::new(MemoryTransport::new());
        let mut device = Link::new(MemoryTransport::new());
        host.send(b"borrowed").unwrap();
        pump(&mut host, &mut device);

        let mut total = 0usize;
        let mut handler = |_seq: u8, payload: &[u8]| total += payload.len();
        device.poll(&mut handler).unwrap();
        assert_eq!(total, 8);
    }
}
