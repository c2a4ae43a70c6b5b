mod bit_reader;
mod color_table;
mod lzw;
mod scanner;
mod sequence;

pub use color_table::{alpha, blue, green, red, rgb, Argb, ColorTable, TRANSPARENT_BLACK};
pub use lzw::{lzw_decode, LzwStatus, LzwTables, MAX_STACK_SIZE};
pub use scanner::{Block, BlockScanner, ByteRegion, ExtensionType};
pub use sequence::{
    FrameDescriptor, FrameSequence, LogicalScreen, LoopCount, DEFAULT_FRAME_DELAY, MIN_FRAME_DELAY,
};

pub(crate) use scanner::*;

/// What happens to a frame's area before the next frame is drawn.
///
/// The GIF "unspecified" value (0) and the reserved values (4-7) are read as
/// [`DisposalMethod::DoNotDispose`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalMethod {
    DoNotDispose = 1,
    RestoreToBackgroundColor = 2,
    RestoreToPrevious = 3,
}

impl DisposalMethod {
    pub fn from_u8(value: u8) -> Self {
        match value {
            2 => DisposalMethod::RestoreToBackgroundColor,
            3 => DisposalMethod::RestoreToPrevious,
            _ => DisposalMethod::DoNotDispose,
        }
    }
}
