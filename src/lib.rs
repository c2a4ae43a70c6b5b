//! Parsing, rendering and in-place editing of animated GIFs.
//!
//! [`FrameSequence::parse`] reads a complete GIF into frame metadata without
//! decompressing anything; a [`GifDecoder`] then composites frames into an
//! RGBA canvas. The [`editor`] functions rewrite timing, looping and frame
//! count directly in the source bytes.

pub mod animation;
pub mod config;
pub mod editor;
pub mod error;
pub mod parser;
pub mod render;

pub use config::{EditorConfig, TrimOptions};
pub use error::{ErrorKind, GifError, Result};
pub use parser::{DisposalMethod, FrameDescriptor, FrameSequence, LoopCount};
pub use render::{Allocator, DecodeStatus, FreeLists, GifDecoder, HeapAllocator, PixelFormat};
