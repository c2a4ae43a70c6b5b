use thiserror::Error;

pub type Result<T> = std::result::Result<T, GifError>;

/// Coarse classification of a [`GifError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The byte stream violates the GIF block grammar. Never recoverable.
    Format,
    /// The stream is well formed but uses a feature this crate refuses to approximate.
    UnsupportedFeature,
    /// The caller passed an argument that cannot be honored.
    InvalidArgument,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GifError {
    #[error("signature is invalid, expected GIF87a or GIF89a")]
    InvalidSignature,

    #[error("unexpected end of data at offset {offset}, needed {needed} more bytes")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("encountered unexpected block label 0x{label:02x} at offset {offset}")]
    UnexpectedLabel { label: u8, offset: usize },

    #[error("{block} at offset {offset} has block size {actual}, expected {expected}")]
    InvalidBlockSize {
        block: &'static str,
        offset: usize,
        expected: u8,
        actual: u8,
    },

    #[error("expected block terminator at offset {offset}, found 0x{actual:02x}")]
    InvalidBlockTerminator { offset: usize, actual: u8 },

    #[error("frame {frame} has no local color table and the stream has no global color table")]
    MissingColorTable { frame: usize },

    #[error("frame {frame} has invalid LZW minimum code size {code_size}")]
    InvalidCodeSize { frame: usize, code_size: u8 },

    #[error("frame {frame} is {width}x{height}, which does not fit a {canvas_width}x{canvas_height} canvas")]
    FrameTooLarge {
        frame: usize,
        width: u16,
        height: u16,
        canvas_width: u16,
        canvas_height: u16,
    },

    #[error("the GIF contains zero images")]
    NoFrames,

    #[error("frame {frame} follows a frame with the restore-to-previous disposal method, which is not supported")]
    RestoreToPreviousUnsupported { frame: usize },

    #[error("frame index {index} is out of range, the sequence has {count} frames")]
    FrameIndexOutOfRange { index: usize, count: usize },

    #[error("number of frames to keep must be at least 1")]
    NothingToKeep,
}

impl GifError {
    pub fn kind(&self) -> ErrorKind {
        use GifError::*;

        match self {
            RestoreToPreviousUnsupported { .. } => ErrorKind::UnsupportedFeature,
            FrameIndexOutOfRange { .. } | NothingToKeep => ErrorKind::InvalidArgument,
            _ => ErrorKind::Format,
        }
    }

    pub fn is_format_error(&self) -> bool {
        self.kind() == ErrorKind::Format
    }
}
