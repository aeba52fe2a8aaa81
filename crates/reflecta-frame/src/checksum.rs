/// Rolling XOR checksum.
///
/// Folding a frame's own checksum byte back in cancels everything out, so a
/// frame is intact iff the accumulator reads zero after the last byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum(u8);

impl Checksum {
    pub fn new() -> Self {
        Self(0)
    }

    /// Accumulator that has already folded in `seed`.
    pub fn starting_at(seed: u8) -> Self {
        Self(seed)
    }

    #[inline]
    pub fn fold(&mut self, byte: u8) {
        self.0 ^= byte;
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 == 0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Checksum of a sequence number and payload as the encoder computes it.
    pub fn of_frame(sequence: u8, payload: &[u8]) -> u8 {
        payload.iter().fold(sequence, |acc, b| acc ^ b)
    }
}
