//! Property tests for the encoder/decoder pair.
//!
//! Frames travel through a [`MemoryTransport`] exactly as they would over a
//! serial line, then are fed back to a decoder in arbitrary chunking.

use bytes::BytesMut;
use proptest::prelude::*;
use reflecta_frame::{
    encode_frame, DiscardViolations, Frame, FrameCollector, FrameConfig, FrameDecoder,
    FrameEncoder, ProtocolViolation, DEFAULT_MAX_PAYLOAD, ESCAPE, FRAME_END,
};
use reflecta_transport::MemoryTransport;

/// Decoder large enough for any payload the default encoder accepts.
fn roomy_decoder() -> FrameDecoder {
    FrameDecoder::with_config(&FrameConfig {
        buffer_capacity: DEFAULT_MAX_PAYLOAD + 1,
        ..FrameConfig::default()
    })
}

fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        // weight towards the bytes that need escaping
        prop::collection::vec(prop_oneof![Just(FRAME_END), Just(ESCAPE), any::<u8>()], 0..=64),
        prop::collection::vec(any::<u8>(), 0..=DEFAULT_MAX_PAYLOAD),
    ]
}

fn send_all(payloads: &[Vec<u8>]) -> Vec<u8> {
    let mut encoder = FrameEncoder::new();
    let mut transport = MemoryTransport::new();
    for payload in payloads {
        encoder.send_frame(&mut transport, payload).unwrap();
    }
    transport.take_outgoing().to_vec()
}

#[test]
fn reference_frame_decodes() {
    let chk: u8 = 0x05 ^ 0x01 ^ 0xC0 ^ 0x02;
    let mut wire = Vec::new();
    for seq in 0..5u8 {
        wire.extend([seq, seq, FRAME_END]);
    }
    wire.extend([0x05, 0x01, 0xDB, 0xDC, 0x02, chk, 0xC0]);

    let mut decoder = FrameDecoder::new();
    let mut frames = FrameCollector::new();
    let mut violations: Vec<ProtocolViolation> = Vec::new();
    decoder.feed(&wire, &mut frames, &mut violations).unwrap();

    assert!(violations.is_empty());
    assert_eq!(frames.frames().last(), Some(&Frame::new(5, vec![0x01, 0xC0, 0x02])));
}

proptest! {
    /// Every frame sent is delivered once, in order, with its payload intact.
    #[test]
    fn roundtrip_preserves_frames(
        payloads in prop::collection::vec(payload_strategy(), 1..8)
    ) {
        let wire = send_all(&payloads);

        let mut decoder = roomy_decoder();
        let mut frames = FrameCollector::new();
        let mut violations: Vec<ProtocolViolation> = Vec::new();
        decoder.feed(&wire, &mut frames, &mut violations).unwrap();

        prop_assert!(violations.is_empty(), "unexpected violations: {:?}", violations);
        let delivered = frames.drain();
        prop_assert_eq!(delivered.len(), payloads.len());
        for (i, (frame, payload)) in delivered.iter().zip(&payloads).enumerate() {
            prop_assert_eq!(frame.sequence, i as u8);
            prop_assert_eq!(frame.payload.as_ref(), payload.as_slice());
        }
    }

    /// Decoding does not depend on how the byte stream is split.
    #[test]
    fn chunking_does_not_matter(
        payloads in prop::collection::vec(payload_strategy(), 1..4),
        chunk in 1..16usize,
    ) {
        let wire = send_all(&payloads);

        let mut whole = FrameCollector::new();
        roomy_decoder().feed(&wire, &mut whole, &mut DiscardViolations).unwrap();

        let mut decoder = roomy_decoder();
        let mut pieces = FrameCollector::new();
        for part in wire.chunks(chunk) {
            decoder.feed(part, &mut pieces, &mut DiscardViolations).unwrap();
        }

        prop_assert_eq!(whole.drain(), pieces.drain());
    }

    /// The delimiter appears exactly once, at the end of the frame.
    #[test]
    fn delimiter_only_terminates(sequence in any::<u8>(), payload in payload_strategy()) {
        let mut wire = BytesMut::new();
        encode_frame(sequence, &payload, &mut wire);

        prop_assert_eq!(wire.iter().filter(|&&b| b == FRAME_END).count(), 1);
        prop_assert_eq!(wire.last(), Some(&FRAME_END));
    }

    /// A payload of reserved bytes doubles in size on the wire.
    #[test]
    fn reserved_bytes_are_escaped(
        payload in prop::collection::vec(prop_oneof![Just(FRAME_END), Just(ESCAPE)], 1..=DEFAULT_MAX_PAYLOAD)
    ) {
        let mut wire = BytesMut::new();
        encode_frame(0, &payload, &mut wire);
        prop_assert!(wire.len() > 2 * payload.len());
    }

    /// Flipping any bit of a payload or checksum byte is caught.
    ///
    /// Bytes are kept below 0x80 so the flip never produces a reserved byte
    /// and the frame keeps its shape.
    #[test]
    fn single_bit_flip_is_detected(
        payload in prop::collection::vec(0u8..0x80, 0..32),
        position in any::<prop::sample::Index>(),
        bit in 0u8..7,
    ) {
        let mut wire = BytesMut::new();
        encode_frame(0, &payload, &mut wire);
        let mut wire = wire.to_vec();
        // positions 1..=payload.len()+1 cover payload and checksum
        let target = 1 + position.index(payload.len() + 1);
        wire[target] ^= 1 << bit;

        let mut decoder = FrameDecoder::new();
        let mut frames = FrameCollector::new();
        let mut violations: Vec<ProtocolViolation> = Vec::new();
        decoder.feed(&wire, &mut frames, &mut violations).unwrap();

        prop_assert!(frames.frames().is_empty());
        prop_assert!(
            matches!(violations[..], [ProtocolViolation::ChecksumMismatch { sequence: 0, .. }]),
            "unexpected violations: {:?}", violations
        );
    }

    /// Whatever garbage precedes them, the second of two frames gets through.
    #[test]
    fn recovers_after_garbage(
        garbage in prop::collection::vec(any::<u8>(), 0..128),
        first in prop::collection::vec(any::<u8>(), 0..32),
        second in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut wire = BytesMut::from(&garbage[..]);
        encode_frame(0x40, &first, &mut wire);
        encode_frame(0x41, &second, &mut wire);

        let mut decoder = FrameDecoder::new();
        let mut frames = FrameCollector::new();
        decoder.feed(&wire, &mut frames, &mut DiscardViolations).unwrap();

        let last = frames.drain().pop();
        prop_assert_eq!(last, Some(Frame::new(0x41, second)));
    }
}
