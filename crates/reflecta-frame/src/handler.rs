use bytes::Bytes;

use crate::codec::Frame;

/// Receives validated frames from the decoder.
///
/// Called synchronously from the consumption loop. `payload` borrows the
/// decoder's receive buffer and is only valid for the duration of the call;
/// copy it out to keep it.
pub trait FrameHandler {
    fn on_frame(&mut self, sequence: u8, payload: &[u8]);
}

impl<F: FnMut(u8, &[u8])> FrameHandler for F {
    fn on_frame(&mut self, sequence: u8, payload: &[u8]) {
        self(sequence, payload)
    }
}

/// Handler that copies every frame into a list.
#[derive(Debug, Default)]
pub struct FrameCollector {
    frames: Vec<Frame>,
}

impl FrameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Remove and return everything collected so far.
    pub fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }
}

impl FrameHandler for FrameCollector {
    fn on_frame(&mut self, sequence: u8, payload: &[u8]) {
        self.frames.push(Frame {
            sequence,
            payload: Bytes::copy_from_slice(payload),
        });
    }
}
