//! Byte cursor over a complete GIF stream.
//!
//! The scanner knows the block grammar (tags, labels, fixed block sizes,
//! sub-block chains) but never looks inside pixel data. Everything it hands
//! out is an offset or a borrowed slice of the underlying buffer.

use log::debug;

use crate::error::{GifError, Result};

pub(crate) const EXTENSION_INTRODUCER: u8 = 0x21;
pub(crate) const IMAGE_DESCRIPTOR_LABEL: u8 = 0x2c;
pub(crate) const TRAILER_LABEL: u8 = 0x3b;

// Extension labels
pub(crate) const APPLICATION_EXTENSION: u8 = 0xff;
pub(crate) const COMMENT_EXTENSION: u8 = 0xfe;
pub(crate) const GRAPHIC_CONTROL_EXTENSION: u8 = 0xf9;
pub(crate) const PLAIN_TEXT_EXTENSION: u8 = 0x01;

pub(crate) const GRAPHIC_CONTROL_BLOCK_SIZE: u8 = 4;
pub(crate) const APPLICATION_BLOCK_SIZE: u8 = 11;
pub(crate) const PLAIN_TEXT_BLOCK_SIZE: u8 = 12;
pub(crate) const NETSCAPE_LOOP_BLOCK_SIZE: u8 = 3;
pub(crate) const NETSCAPE_LOOP_SUB_BLOCK_ID: u8 = 1;
pub(crate) const NETSCAPE_IDENTIFIER: &[u8; 11] = b"NETSCAPE2.0";

const COLOR_TABLE_FLAG: u8 = 0b1000_0000;
const COLOR_TABLE_SIZE: u8 = 0b0000_0111;

/// Half-open range `start..end` of offsets into the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRegion {
    pub start: usize,
    pub end: usize,
}

impl ByteRegion {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end >= start);
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionType {
    Application,
    Comment,
    GraphicControl,
    PlainText,
    Unknown(u8),
}

impl From<u8> for ExtensionType {
    fn from(value: u8) -> Self {
        use ExtensionType::*;

        match value {
            APPLICATION_EXTENSION => Application,
            COMMENT_EXTENSION => Comment,
            GRAPHIC_CONTROL_EXTENSION => GraphicControl,
            PLAIN_TEXT_EXTENSION => PlainText,
            label => Unknown(label),
        }
    }
}

/// A top-level block, classified by its leading tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Extension(ExtensionType),
    ImageDescriptor,
    Trailer,
}

/// Size in entries of a color table described by a packed field, or `None`
/// when the table-present flag is clear.
pub(crate) fn color_table_len(packed_fields: u8) -> Option<usize> {
    if packed_fields & COLOR_TABLE_FLAG == 0 {
        return None;
    }
    Some(1 << ((packed_fields & COLOR_TABLE_SIZE) + 1))
}

#[derive(Debug)]
pub struct BlockScanner<B> {
    buf: B,
    position: usize,
}

impl<B: AsRef<[u8]>> BlockScanner<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    fn ensure(&self, count: usize) -> Result<()> {
        let len = self.buf.as_ref().len();
        if self.position + count > len {
            return Err(GifError::UnexpectedEof {
                offset: self.position,
                needed: self.position + count - len,
            });
        }
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let byte = self.buf.as_ref()[self.position];
        self.position += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        // multi-byte numeric fields are ordered with the least significant byte first
        self.ensure(2)?;
        let buf = self.buf.as_ref();
        let value = u16::from_le_bytes([buf[self.position], buf[self.position + 1]]);
        self.position += 2;
        Ok(value)
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8]> {
        self.ensure(count)?;
        let start = self.position;
        self.position += count;
        Ok(&self.buf.as_ref()[start..self.position])
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.position += count;
        Ok(())
    }

    /// Reads the six byte header, accepting only `GIF87a` and `GIF89a`.
    pub fn read_signature(&mut self) -> Result<[u8; 6]> {
        let mut signature = [0; 6];
        signature.copy_from_slice(self.read_bytes(6).map_err(|_| GifError::InvalidSignature)?);
        match &signature {
            b"GIF87a" | b"GIF89a" => Ok(signature),
            _ => Err(GifError::InvalidSignature),
        }
    }

    /// Reads the tag byte (and the label byte for extensions) of the next
    /// top-level block.
    pub fn next_block(&mut self) -> Result<Block> {
        let offset = self.position;
        let introducer_or_label = self.read_byte()?;

        let block = match introducer_or_label {
            // extension introducer means that a label follows determining what exact type
            // of extension it is.
            EXTENSION_INTRODUCER => Block::Extension(ExtensionType::from(self.read_byte()?)),
            IMAGE_DESCRIPTOR_LABEL => Block::ImageDescriptor,
            TRAILER_LABEL => Block::Trailer,
            label => return Err(GifError::UnexpectedLabel { label, offset }),
        };
        debug!("block {:?} at {}", block, offset);
        Ok(block)
    }

    pub fn expect_block_size(&mut self, block: &'static str, expected: u8) -> Result<()> {
        let offset = self.position;
        let actual = self.read_byte()?;
        if actual != expected {
            return Err(GifError::InvalidBlockSize { block, offset, expected, actual });
        }
        Ok(())
    }

    pub fn expect_terminator(&mut self) -> Result<()> {
        let offset = self.position;
        let actual = self.read_byte()?;
        if actual != 0 {
            return Err(GifError::InvalidBlockTerminator { offset, actual });
        }
        Ok(())
    }

    /// Skips a length-prefixed sub-block chain up to and including its zero
    /// length terminator, returning the region it occupied.
    pub fn skip_sub_blocks(&mut self) -> Result<ByteRegion> {
        let start = self.position;
        loop {
            let len = self.read_byte()?;
            if len == 0 {
                break;
            }
            self.skip(len.into())?;
        }
        Ok(ByteRegion::new(start, self.position))
    }

    /// Skips the color table announced by `packed_fields`, if any.
    pub fn skip_color_table(&mut self, packed_fields: u8) -> Result<()> {
        match color_table_len(packed_fields) {
            Some(len) => self.skip(3 * len),
            None => Ok(()),
        }
    }

    /// Skips the logical screen descriptor and the global color table that may follow it.
    pub fn skip_screen_descriptor(&mut self) -> Result<()> {
        self.skip(4)?; // canvas width and height
        let packed_fields = self.read_byte()?;
        self.skip(2)?; // background color index and pixel aspect ratio
        self.skip_color_table(packed_fields)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> BlockScanner<B> {
    /// Overwrites the little-endian 16-bit field at `offset` without moving the cursor.
    pub fn write_u16_at(&mut self, offset: usize, value: u16) {
        self.buf.as_mut()[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}
