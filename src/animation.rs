//! Codec-neutral view of an animation: frames with timing, and something
//! that can render them.

use crate::error::Result;
use crate::parser::{FrameDescriptor, FrameSequence};
use crate::render::{Allocator, Bitmap, GifDecoder};

pub trait Frame {
    /// Timestamp recognized on the rendered frame, once assigned.
    fn timestamp(&self) -> Option<i64>;
    fn delay_ms(&self) -> u32;
}

pub trait Sequence {
    type Frame: Frame;

    fn frames(&self) -> &[Self::Frame];
    fn width(&self) -> u16;
    fn height(&self) -> u16;

    fn frame_count(&self) -> usize {
        self.frames().len()
    }

    /// Sum of all frame delays.
    fn duration_ms(&self) -> u64 {
        self.frames().iter().map(|frame| u64::from(frame.delay_ms())).sum()
    }
}

pub trait FrameDecoder {
    fn frame_count(&self) -> usize;
    fn decode_bitmap(&mut self, index: usize) -> Result<Bitmap>;
}

impl Frame for FrameDescriptor {
    fn timestamp(&self) -> Option<i64> {
        FrameDescriptor::timestamp(self)
    }

    fn delay_ms(&self) -> u32 {
        FrameDescriptor::delay_ms(self)
    }
}

impl Sequence for FrameSequence {
    type Frame = FrameDescriptor;

    fn frames(&self) -> &[FrameDescriptor] {
        FrameSequence::frames(self)
    }

    fn width(&self) -> u16 {
        FrameSequence::width(self)
    }

    fn height(&self) -> u16 {
        FrameSequence::height(self)
    }
}

impl<A: Allocator> FrameDecoder for GifDecoder<'_, A> {
    fn frame_count(&self) -> usize {
        GifDecoder::frame_count(self)
    }

    fn decode_bitmap(&mut self, index: usize) -> Result<Bitmap> {
        GifDecoder::decode_bitmap(self, index)
    }
}

/// Indices of the frames that carry a timestamp, oldest first. Frames with
/// equal timestamps keep their sequence order.
pub fn frames_by_timestamp<S: Sequence>(sequence: &S) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..sequence.frame_count())
        .filter(|&index| sequence.frames()[index].timestamp().is_some())
        .collect();
    indices.sort_by_key(|&index| sequence.frames()[index].timestamp());
    indices
}
