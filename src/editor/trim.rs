use log::{debug, info, warn};

use super::frame_ring::FrameRing;
use crate::config::TrimOptions;
use crate::error::{GifError, Result};
use crate::parser::*;

/// Length of a graphic control extension including introducer and terminator.
const GRAPHIC_CONTROL_LEN: usize = 8;
/// Length of a Netscape looping extension including introducer and terminator.
const NETSCAPE_LOOP_LEN: usize = 19;

/// Where one frame lives in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameSpan {
    /// First block belonging to the frame, its graphic control extension if
    /// it has one.
    start: usize,
    packed_fields: u8,
    transparent_index: u8,
    /// Offset of the image separator.
    image_start: usize,
    data: ByteRegion,
}

impl FrameSpan {
    /// Image descriptor through the end of the compressed data.
    fn image_len(&self) -> usize {
        self.data.end - self.image_start
    }

    fn shift(&mut self, by: usize) {
        self.start += by;
        self.image_start += by;
        self.data = ByteRegion::new(self.data.start + by, self.data.end + by);
    }
}

/// Result of the editor's forward scan.
#[derive(Debug)]
struct FrameScan {
    /// Offset of the first block after the logical screen descriptor.
    first_block: usize,
    /// Start of the first frame.
    first_frame: Option<usize>,
    /// Offset just past the trailer.
    end: usize,
    frames_seen: usize,
    distinct_frames: usize,
    kept: FrameRing<FrameSpan>,
}

/// Scans the block grammar of `buf`, keeping the last `frames_to_keep`
/// frames. With `dedup`, a frame whose compressed data equals the newest
/// kept frame's is dropped.
fn scan_frames(buf: &[u8], frames_to_keep: usize, dedup: bool) -> Result<FrameScan> {
    let mut scanner = BlockScanner::new(buf);
    scanner.read_signature()?;
    scanner.skip_screen_descriptor()?;

    let first_block = scanner.position();
    let mut first_frame = None;
    let mut kept = FrameRing::new(frames_to_keep);
    let mut frames_seen = 0;
    let mut distinct_frames = 0;
    // graphic control extension of the frame in progress
    let mut control: Option<(usize, u8, u8)> = None;

    loop {
        let block_start = scanner.position();
        match scanner.next_block()? {
            Block::Extension(ExtensionType::GraphicControl) => {
                scanner.expect_block_size("graphic control extension", GRAPHIC_CONTROL_BLOCK_SIZE)?;
                let packed_fields = scanner.read_byte()?;
                let delay = scanner.read_u16()?;
                let transparent_index = scanner.read_byte()?;
                scanner.expect_terminator()?;
                debug!("graphic control extension at {}, delay {}", block_start, delay);
                control = Some((block_start, packed_fields, transparent_index));
            }
            Block::Extension(ExtensionType::Application) => {
                scanner.expect_block_size("application extension", APPLICATION_BLOCK_SIZE)?;
                if scanner.read_bytes(11)? == NETSCAPE_IDENTIFIER {
                    check_netscape_extension(&mut scanner)?;
                } else {
                    scanner.skip_sub_blocks()?;
                }
            }
            Block::Extension(label) => {
                debug!("skipping extension {:?} at {}", label, block_start);
                scanner.skip_sub_blocks()?;
            }
            Block::ImageDescriptor => {
                scanner.skip(8)?; // image position and size
                let packed_fields = scanner.read_byte()?;
                scanner.skip_color_table(packed_fields)?;
                scanner.skip(1)?; // LZW minimum code size
                let data = scanner.skip_sub_blocks()?;

                let (start, packed_fields, transparent_index) =
                    control.take().unwrap_or((block_start, 0, 0));
                first_frame.get_or_insert(start);
                let frame = FrameSpan {
                    start,
                    packed_fields,
                    transparent_index,
                    image_start: block_start,
                    data,
                };
                frames_seen += 1;

                let duplicate = dedup
                    && kept
                        .back()
                        .is_some_and(|newest: &FrameSpan| newest.data.slice(buf) == data.slice(buf));
                if duplicate {
                    debug!("dropping frame {} identical to the previous one", frames_seen - 1);
                    continue;
                }
                distinct_frames += 1;
                if let Some(evicted) = kept.push(frame) {
                    debug!("evicting frame at {}", evicted.image_start);
                }
            }
            Block::Trailer => break,
        }
    }

    Ok(FrameScan {
        first_block,
        first_frame,
        end: scanner.position(),
        frames_seen,
        distinct_frames,
        kept,
    })
}

fn check_netscape_extension(scanner: &mut BlockScanner<&[u8]>) -> Result<()> {
    loop {
        let offset = scanner.position();
        let len = scanner.read_byte()?;
        if len == 0 {
            return Ok(());
        }
        let sub_block = scanner.read_bytes(len.into())?;
        if sub_block[0] == NETSCAPE_LOOP_SUB_BLOCK_ID && len != NETSCAPE_LOOP_BLOCK_SIZE {
            return Err(GifError::InvalidBlockSize {
                block: "netscape looping extension",
                offset,
                expected: NETSCAPE_LOOP_BLOCK_SIZE,
                actual: len,
            });
        }
    }
}

/// Checks that `buf` is a well-formed GIF the editors can work on, without
/// modifying it. Returns the number of frames.
pub fn check_gif(buf: &[u8]) -> Result<usize> {
    let scan = scan_frames(buf, 1, false)?;
    Ok(scan.frames_seen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimSummary {
    pub frames: usize,
    pub distinct_frames: usize,
    pub kept_frames: usize,
    pub last_frame_hold: u16,
}

/// Cursor writing the rebuilt stream over the buffer it was read from.
struct Rewriter<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl Rewriter<'_> {
    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.position..self.position + bytes.len()].copy_from_slice(bytes);
        self.position += bytes.len();
    }

    fn put_loop_extension(&mut self, loop_count: u16) {
        self.put(&[EXTENSION_INTRODUCER, APPLICATION_EXTENSION, APPLICATION_BLOCK_SIZE]);
        self.put(NETSCAPE_IDENTIFIER);
        self.put(&[NETSCAPE_LOOP_BLOCK_SIZE, NETSCAPE_LOOP_SUB_BLOCK_ID]);
        self.put(&loop_count.to_le_bytes());
        self.put(&[0]);
    }

    fn put_graphic_control(&mut self, frame: &FrameSpan, delay: u16) {
        let [delay_lo, delay_hi] = delay.to_le_bytes();
        self.put(&[
            EXTENSION_INTRODUCER,
            GRAPHIC_CONTROL_EXTENSION,
            GRAPHIC_CONTROL_BLOCK_SIZE,
            frame.packed_fields,
            delay_lo,
            delay_hi,
            frame.transparent_index,
            0,
        ]);
    }

    /// Moves the frame's image descriptor and data to the cursor.
    fn copy_image(&mut self, frame: &FrameSpan) {
        if frame.image_start != self.position {
            self.buf.copy_within(frame.image_start..frame.data.end, self.position);
        }
        self.position += frame.image_len();
    }
}

/// How many bytes the rebuilt layout would run ahead of the source data it
/// still has to read.
fn overtake(first_block: usize, frames: &FrameRing<FrameSpan>) -> usize {
    let mut dest = first_block + NETSCAPE_LOOP_LEN;
    let mut shortfall = 0;
    for frame in frames.iter() {
        dest += GRAPHIC_CONTROL_LEN;
        shortfall = shortfall.max(dest.saturating_sub(frame.image_start));
        dest += frame.image_len();
    }
    shortfall
}

/// Retimes `buf` and trims it to the last `frames_to_keep` distinct frames.
///
/// Runs of frames with identical compressed data collapse into one. The
/// stream is rebuilt in place as a Netscape loop extension followed by the
/// kept frames, each with a fresh graphic control extension carrying
/// `delay`; the last one holds for whatever remains of the animation
/// duration. Every other extension is dropped and `buf` is truncated to the
/// new length.
pub fn edit_gif(buf: &mut Vec<u8>, options: &TrimOptions) -> Result<TrimSummary> {
    if options.frames_to_keep == 0 {
        return Err(GifError::NothingToKeep);
    }
    let FrameScan { first_block, end, frames_seen, distinct_frames, mut kept, .. } =
        scan_frames(buf, options.frames_to_keep, true)?;
    if kept.is_empty() {
        return Err(GifError::NoFrames);
    }
    buf.truncate(end);

    let shortfall = overtake(first_block, &kept);
    if shortfall > 0 {
        warn!("widening buffer by {} bytes to rebuild in place", shortfall);
        buf.splice(first_block..first_block, std::iter::repeat(0).take(shortfall));
        kept.iter_mut().for_each(|frame| frame.shift(shortfall));
    }

    let kept_frames = kept.len();
    let last_frame_hold = options.last_frame_hold(kept_frames);

    let mut rewriter = Rewriter { buf: buf.as_mut_slice(), position: first_block };
    rewriter.put_loop_extension(options.loop_count);
    for (index, frame) in kept.iter().enumerate() {
        let delay = if index + 1 == kept_frames { last_frame_hold } else { options.delay };
        rewriter.put_graphic_control(frame, delay);
        rewriter.copy_image(frame);
    }
    rewriter.put(&[TRAILER_LABEL]);
    let len = rewriter.position;
    buf.truncate(len);

    info!(
        "kept {} of {} frames ({} distinct), last frame holds {}",
        kept_frames, frames_seen, distinct_frames, last_frame_hold
    );
    Ok(TrimSummary { frames: frames_seen, distinct_frames, kept_frames, last_frame_hold })
}

/// Drops all but the last `frames_to_keep` frames, leaving every kept byte as
/// it was.
///
/// The blocks before the first frame (such as the Netscape loop extension)
/// stay in place; everything from the first kept frame through the trailer
/// moves down in a single copy. Returns the number of frames dropped.
pub fn drop_leading_frames(buf: &mut Vec<u8>, frames_to_keep: usize) -> Result<usize> {
    if frames_to_keep == 0 {
        return Err(GifError::NothingToKeep);
    }
    let scan = scan_frames(buf, frames_to_keep, false)?;
    let (Some(first), Some(first_kept)) = (scan.first_frame, scan.kept.front()) else {
        return Err(GifError::NoFrames);
    };
    buf.truncate(scan.end);

    let dropped = scan.frames_seen - scan.kept.len();
    if dropped == 0 {
        return Ok(0);
    }
    buf.copy_within(first_kept.start..scan.end, first);
    buf.truncate(first + scan.end - first_kept.start);
    info!("dropped {} leading frames, kept {}", dropped, scan.kept.len());
    Ok(dropped)
}
