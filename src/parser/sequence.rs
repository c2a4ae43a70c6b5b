use std::sync::{Arc, OnceLock};

use log::debug;

use super::color_table::{Argb, ColorTable, TRANSPARENT_BLACK};
use super::lzw::MAX_MINIMUM_CODE_SIZE;
use super::scanner::*;
use super::DisposalMethod;
use crate::error::{GifError, Result};

/// The minimum frame delay in hundredths of a second.
pub const MIN_FRAME_DELAY: u16 = 2;
/// Delay used for frames whose delay is below [`MIN_FRAME_DELAY`].
pub const DEFAULT_FRAME_DELAY: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    /// Play `n + 1` times in total.
    Number(u16),
}

impl LoopCount {
    pub fn from_raw(value: u16) -> Self {
        match value {
            0 => LoopCount::Infinite,
            number => LoopCount::Number(number),
        }
    }

    pub fn total_iterations(&self) -> Option<u32> {
        match self {
            LoopCount::Infinite => None,
            LoopCount::Number(n) => Some(u32::from(*n) + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalScreen {
    pub width: u16,
    pub height: u16,
    pub global_color_table: Option<ColorTable>,
    pub background_index: u8,
    pub pixel_aspect: u8,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphicControlExtension {
    disposal_method: DisposalMethod,
    user_input_flag: bool,
    transparent_color_flag: bool,

    delay_time: u16,
    transparent_color_index: u8,
}

/// Metadata of one frame, plus the location of its still-compressed pixels.
#[derive(Debug, Clone)]
pub struct FrameDescriptor {
    pub(crate) index: usize,

    pub(crate) left: u16,
    pub(crate) top: u16,
    pub(crate) width: u16,
    pub(crate) height: u16,

    pub(crate) interlace: bool,
    pub(crate) transparency: bool,
    pub(crate) transparent_index: u8,
    pub(crate) disposal_method: DisposalMethod,
    pub(crate) delay: u16,
    pub(crate) local_color_table: Option<ColorTable>,

    pub(crate) lzw_min_code_size: u8,
    pub(crate) compressed_data: ByteRegion,

    pub(crate) timestamp: OnceLock<i64>,
}

impl FrameDescriptor {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Frame rectangle as `(left, top, width, height)` within the canvas.
    pub fn rect(&self) -> (u16, u16, u16, u16) {
        (self.left, self.top, self.width, self.height)
    }

    pub fn interlace(&self) -> bool {
        self.interlace
    }

    pub fn transparent_index(&self) -> Option<u8> {
        self.transparency.then_some(self.transparent_index)
    }

    pub fn disposal_method(&self) -> DisposalMethod {
        self.disposal_method
    }

    /// Delay to the next frame in hundredths of a second.
    pub fn delay_centiseconds(&self) -> u16 {
        self.delay
    }

    pub fn delay_ms(&self) -> u32 {
        u32::from(self.delay) * 10
    }

    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.local_color_table.as_ref()
    }

    pub fn lzw_min_code_size(&self) -> u8 {
        self.lzw_min_code_size
    }

    pub fn compressed_data(&self) -> ByteRegion {
        self.compressed_data
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp.get().copied()
    }

    /// Records the frame's timestamp. Returns `false` if one was already set.
    pub fn set_timestamp(&self, timestamp: i64) -> bool {
        self.timestamp.set(timestamp).is_ok()
    }
}

/// A parsed GIF: canvas, color tables and frame descriptors, without decoded pixels.
///
/// Immutable once built and cheap to share; any number of decoders may render
/// it concurrently.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    pub(crate) data: Arc<[u8]>,
    pub(crate) screen: LogicalScreen,
    pub(crate) frames: Vec<FrameDescriptor>,
    pub(crate) loop_count: Option<LoopCount>,
    pub(crate) background_color: Argb,
}

impl FrameSequence {
    pub fn parse(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let data = data.into();
        let parsed = SequenceParser::new(&data).parse()?;
        let ParsedSequence { screen, frames, loop_count } = parsed;

        let background_color = screen
            .global_color_table
            .as_ref()
            .map_or(TRANSPARENT_BLACK, |table| table.get(screen.background_index));

        Ok(Self { data, screen, frames, loop_count, background_color })
    }

    pub fn width(&self) -> u16 {
        self.screen.width
    }

    pub fn height(&self) -> u16 {
        self.screen.height
    }

    pub fn pixel_count(&self) -> usize {
        usize::from(self.screen.width) * usize::from(self.screen.height)
    }

    pub fn screen(&self) -> &LogicalScreen {
        &self.screen
    }

    pub fn global_color_table(&self) -> Option<&ColorTable> {
        self.screen.global_color_table.as_ref()
    }

    pub fn frames(&self) -> &[FrameDescriptor] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn loop_count(&self) -> Option<LoopCount> {
        self.loop_count
    }

    pub fn background_color(&self) -> Argb {
        self.background_color
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The LZW sub-block chain of a frame.
    pub fn compressed_data(&self, frame: &FrameDescriptor) -> &[u8] {
        frame.compressed_data.slice(&self.data)
    }
}

struct ParsedSequence {
    screen: LogicalScreen,
    frames: Vec<FrameDescriptor>,
    loop_count: Option<LoopCount>,
}

#[derive(Debug)]
enum ParserState {
    ProcessMagic,
    ProcessLogicalScreenDescriptor,
    ProcessGlobalColorTable(usize),

    DetermineNextBlock(Option<GraphicControlExtension>),
    ProcessExtension(ExtensionType, Option<GraphicControlExtension>),
    ProcessImageDescriptor(Option<GraphicControlExtension>),

    Done,
}

struct SequenceParser<'a> {
    scanner: BlockScanner<&'a [u8]>,
    screen: Option<LogicalScreen>,
    frames: Vec<FrameDescriptor>,
    loop_count: Option<LoopCount>,
}

impl<'a> SequenceParser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            scanner: BlockScanner::new(data),
            screen: None,
            frames: Vec::new(),
            loop_count: None,
        }
    }

    fn parse(mut self) -> Result<ParsedSequence> {
        let mut state = ParserState::ProcessMagic;

        loop {
            debug!("begin parsing state {:?}", state);

            state = self.process_next_state(state)?;
            if let ParserState::Done = state {
                break;
            }
        }

        if self.frames.is_empty() {
            return Err(GifError::NoFrames);
        }
        let screen = self.screen.take().ok_or(GifError::InvalidSignature)?;
        Ok(ParsedSequence { screen, frames: self.frames, loop_count: self.loop_count })
    }

    fn screen(&self) -> Result<&LogicalScreen> {
        // the descriptor directly follows the signature, so it is always read before any block
        self.screen.as_ref().ok_or(GifError::InvalidSignature)
    }

    fn process_next_state(&mut self, next_state: ParserState) -> Result<ParserState> {
        use ParserState::*;

        match next_state {
            ProcessMagic => {
                let signature = self.scanner.read_signature()?;
                debug!("processed signature, got {}", String::from_utf8_lossy(&signature));

                Ok(ProcessLogicalScreenDescriptor)
            }
            ProcessLogicalScreenDescriptor => {
                let width = self.scanner.read_u16()?;
                let height = self.scanner.read_u16()?;
                let packed_fields = self.scanner.read_byte()?;
                let background_index = self.scanner.read_byte()?;
                let pixel_aspect = self.scanner.read_byte()?;

                self.screen = Some(LogicalScreen {
                    width,
                    height,
                    global_color_table: None,
                    background_index,
                    pixel_aspect,
                });
                debug!("processed logical screen descriptor, got: {:?}", self.screen);

                let next_state = match color_table_len(packed_fields) {
                    Some(len) => ProcessGlobalColorTable(len),
                    None => DetermineNextBlock(None),
                };
                Ok(next_state)
            }
            ProcessGlobalColorTable(len) => {
                let table = ColorTable::from_rgb(self.scanner.read_bytes(3 * len)?);
                debug!("processed global color table with {} entries", table.len());
                if let Some(screen) = self.screen.as_mut() {
                    screen.global_color_table = Some(table);
                }

                Ok(DetermineNextBlock(None))
            }
            DetermineNextBlock(graphic_control_extension) => match self.scanner.next_block()? {
                Block::Extension(label) => Ok(ProcessExtension(label, graphic_control_extension)),
                Block::ImageDescriptor => Ok(ProcessImageDescriptor(graphic_control_extension)),
                Block::Trailer => Ok(Done),
            },
            ProcessExtension(label, graphic_control_extension) => {
                self.process_extension(label, graphic_control_extension)
            }
            ProcessImageDescriptor(graphic_control_extension) => {
                self.process_image_descriptor(graphic_control_extension)?;
                Ok(DetermineNextBlock(None))
            }
            Done => Ok(Done),
        }
    }

    fn process_extension(
        &mut self,
        label: ExtensionType,
        pending: Option<GraphicControlExtension>,
    ) -> Result<ParserState> {
        use ExtensionType::*;

        debug!("processing extension type: {:?}", label);
        match label {
            GraphicControl => {
                // a new graphic control extension starts a new frame
                let graphic_control_extension = self.read_graphic_control_extension()?;
                debug!("processed GraphicControlExtension: {:?}", graphic_control_extension);
                Ok(ParserState::DetermineNextBlock(Some(graphic_control_extension)))
            }
            Application => {
                self.scanner.expect_block_size("application extension", APPLICATION_BLOCK_SIZE)?;
                let application_identifier = self.scanner.read_bytes(11)?;

                if application_identifier == NETSCAPE_IDENTIFIER {
                    self.read_netscape_extension()?;
                } else {
                    debug!(
                        "skipping application extension {}",
                        String::from_utf8_lossy(application_identifier)
                    );
                    self.scanner.skip_sub_blocks()?;
                }
                Ok(ParserState::DetermineNextBlock(pending))
            }
            PlainText => {
                self.scanner.expect_block_size("plain text extension", PLAIN_TEXT_BLOCK_SIZE)?;
                self.scanner.skip(PLAIN_TEXT_BLOCK_SIZE.into())?;
                self.scanner.skip_sub_blocks()?;
                Ok(ParserState::DetermineNextBlock(pending))
            }
            Comment | Unknown(_) => {
                self.scanner.skip_sub_blocks()?;
                Ok(ParserState::DetermineNextBlock(pending))
            }
        }
    }

    fn read_graphic_control_extension(&mut self) -> Result<GraphicControlExtension> {
        self.scanner
            .expect_block_size("graphic control extension", GRAPHIC_CONTROL_BLOCK_SIZE)?;

        // packed fields definition
        // XXXYYYZW
        // XXX = reserved, not needed
        // YYY = disposal method, indicates what to do with graphic after displaying
        // Z = user input flag
        // W = transparent color flag
        let packed_fields = self.scanner.read_byte()?;
        let disposal_method = DisposalMethod::from_u8((packed_fields >> 2) & 0b00000111);
        let user_input_flag = packed_fields & 0b00000010 != 0;
        let transparent_color_flag = packed_fields & 0b00000001 != 0;

        let mut delay_time = self.scanner.read_u16()?;
        if delay_time < MIN_FRAME_DELAY {
            delay_time = DEFAULT_FRAME_DELAY;
        }
        let transparent_color_index = self.scanner.read_byte()?;
        self.scanner.expect_terminator()?;

        Ok(GraphicControlExtension {
            disposal_method,
            user_input_flag,
            transparent_color_flag,
            delay_time,
            transparent_color_index,
        })
    }

    fn read_netscape_extension(&mut self) -> Result<()> {
        loop {
            let offset = self.scanner.position();
            let len = self.scanner.read_byte()?;
            if len == 0 {
                return Ok(());
            }
            let sub_block = self.scanner.read_bytes(len.into())?;
            if sub_block[0] != NETSCAPE_LOOP_SUB_BLOCK_ID {
                continue;
            }
            if len != NETSCAPE_LOOP_BLOCK_SIZE {
                return Err(GifError::InvalidBlockSize {
                    block: "netscape looping extension",
                    offset,
                    expected: NETSCAPE_LOOP_BLOCK_SIZE,
                    actual: len,
                });
            }
            let loop_count = LoopCount::from_raw(u16::from_le_bytes([sub_block[1], sub_block[2]]));
            debug!("netscape extension loop count {:?}", loop_count);
            self.loop_count = Some(loop_count);
        }
    }

    fn process_image_descriptor(
        &mut self,
        graphic_control_extension: Option<GraphicControlExtension>,
    ) -> Result<()> {
        let index = self.frames.len();

        let left = self.scanner.read_u16()?;
        let top = self.scanner.read_u16()?;
        let width = self.scanner.read_u16()?;
        let height = self.scanner.read_u16()?;

        let packed_fields = self.scanner.read_byte()?;
        let interlace = packed_fields & 0b01000000 != 0;
        let local_color_table = match color_table_len(packed_fields) {
            Some(len) => Some(ColorTable::from_rgb(self.scanner.read_bytes(3 * len)?)),
            None => None,
        };

        let screen = self.screen()?;
        if local_color_table.is_none() && screen.global_color_table.is_none() {
            return Err(GifError::MissingColorTable { frame: index });
        }
        if usize::from(width) * usize::from(height)
            > usize::from(screen.width) * usize::from(screen.height)
        {
            return Err(GifError::FrameTooLarge {
                frame: index,
                width,
                height,
                canvas_width: screen.width,
                canvas_height: screen.height,
            });
        }

        let lzw_min_code_size = self.scanner.read_byte()?;
        if lzw_min_code_size > MAX_MINIMUM_CODE_SIZE {
            return Err(GifError::InvalidCodeSize { frame: index, code_size: lzw_min_code_size });
        }
        let compressed_data = self.scanner.skip_sub_blocks()?;

        // The graphic control extension is optional; without one the frame gets defaults.
        let control = graphic_control_extension.unwrap_or(GraphicControlExtension {
            disposal_method: DisposalMethod::DoNotDispose,
            user_input_flag: false,
            transparent_color_flag: false,
            delay_time: DEFAULT_FRAME_DELAY,
            transparent_color_index: 0,
        });

        let frame = FrameDescriptor {
            index,
            left,
            top,
            width,
            height,
            interlace,
            transparency: control.transparent_color_flag,
            transparent_index: control.transparent_color_index,
            disposal_method: control.disposal_method,
            delay: control.delay_time,
            local_color_table,
            lzw_min_code_size,
            compressed_data,
            timestamp: OnceLock::new(),
        };
        debug!(
            "processed frame {} at {}x{}+{}+{}, {} bytes of image data, user input {}",
            index,
            width,
            height,
            left,
            top,
            compressed_data.len(),
            control.user_input_flag
        );
        self.frames.push(frame);
        Ok(())
    }
}
