use log::{debug, warn};

use super::allocator::Allocator;
use super::bitmap::{Bitmap, PixelFormat};
use super::pixels::{CanvasPixels, Pixels};
use crate::error::{GifError, Result};
use crate::parser::{
    lzw_decode, Argb, ColorTable, DisposalMethod, FrameDescriptor, FrameSequence, LzwStatus,
    LzwTables, TRANSPARENT_BLACK,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    Ok,
    /// The last decoded frame ran out of image data; its missing pixels are
    /// transparent black.
    PartialDecode,
}

/// Working buffers of one decoder, sized once for the canvas and reused for
/// every frame.
pub(crate) struct DecoderState {
    lzw: LzwTables,
    indices: Vec<u8>,
    canvas: Vec<Argb>,
    // private copy of the active color table for frames with transparency
    scratch_table: ColorTable,
}

impl DecoderState {
    fn obtain(allocator: &impl Allocator, pixel_count: usize) -> Self {
        Self {
            lzw: LzwTables::new(),
            indices: allocator.obtain_bytes(pixel_count),
            canvas: allocator.obtain_ints(pixel_count),
            scratch_table: ColorTable::default(),
        }
    }

    fn release(&mut self, allocator: &impl Allocator) {
        allocator.release_bytes(std::mem::take(&mut self.indices));
        allocator.release_ints(std::mem::take(&mut self.canvas));
    }
}

/// Destination rows in the order an interlaced image stores them.
fn interlaced_rows(height: usize) -> impl Iterator<Item = usize> {
    [(0, 8), (4, 8), (2, 4), (1, 2)]
        .into_iter()
        .flat_map(move |(start, step)| (start..height).step_by(step))
}

/// Renders the frames of one [`FrameSequence`] into a canvas it owns.
///
/// Frames are composited in display order, each on top of what the previous
/// one left behind. The decoder is single-owner; render the same sequence
/// concurrently by giving each consumer its own decoder.
pub struct GifDecoder<'a, A: Allocator> {
    sequence: &'a FrameSequence,
    allocator: A,
    state: DecoderState,
    status: DecodeStatus,
    first_frame_transparent: Option<bool>,
    default_format: PixelFormat,
    current_frame: Option<usize>,
}

impl<'a, A: Allocator> GifDecoder<'a, A> {
    pub fn new(sequence: &'a FrameSequence, allocator: A) -> Self {
        let state = DecoderState::obtain(&allocator, sequence.pixel_count());
        Self {
            sequence,
            allocator,
            state,
            status: DecodeStatus::Ok,
            first_frame_transparent: None,
            default_format: PixelFormat::Argb8888,
            current_frame: None,
        }
    }

    pub fn sequence(&self) -> &'a FrameSequence {
        self.sequence
    }

    /// Outcome of the last requested frame. Frames replayed on the way to
    /// it do not count.
    pub fn status(&self) -> DecodeStatus {
        self.status
    }

    pub fn frame_count(&self) -> usize {
        self.sequence.frame_count()
    }

    /// Whether frame 0 turned out to contain transparent pixels; `None` until
    /// it has been rendered.
    pub fn first_frame_transparent(&self) -> Option<bool> {
        self.first_frame_transparent
    }

    /// Format used for bitmaps once the first frame is known to be fully
    /// opaque. Until then, and for sequences with a transparent first frame,
    /// bitmaps are always [`PixelFormat::Argb8888`].
    pub fn set_default_pixel_format(&mut self, format: PixelFormat) {
        self.default_format = format;
    }

    /// The canvas as left by the last rendered frame.
    pub fn pixels(&self) -> CanvasPixels<'_> {
        CanvasPixels::new(&self.state.canvas, self.sequence.width().into())
    }

    /// Renders frame `index` and returns the canvas.
    ///
    /// The canvas is reused by the next call; copy it to keep a snapshot.
    /// Rendering frame `n` right after frame `n - 1` composites one frame;
    /// any other order replays the animation from frame 0.
    pub fn decode_frame(&mut self, index: usize) -> Result<&[Argb]> {
        let count = self.sequence.frame_count();
        if index >= count {
            return Err(GifError::FrameIndexOutOfRange { index, count });
        }
        let start = match self.current_frame {
            Some(current) if current == index => return Ok(&self.state.canvas),
            Some(current) if current + 1 == index => index,
            _ => 0,
        };
        if start != index {
            debug!("replaying frames {}..={}", start, index);
        }

        self.current_frame = None;
        for frame_index in start..=index {
            self.status = DecodeStatus::Ok;
            self.composite(frame_index)?;
        }
        self.current_frame = Some(index);
        Ok(&self.state.canvas)
    }

    /// Renders frame `index` into a bitmap obtained from the allocator. The
    /// caller hands it back through [`Allocator::release_bitmap`].
    pub fn decode_bitmap(&mut self, index: usize) -> Result<Bitmap> {
        self.decode_frame(index)?;

        let format = match self.first_frame_transparent {
            Some(false) => self.default_format,
            _ => PixelFormat::Argb8888,
        };
        let mut bitmap =
            self.allocator.obtain_bitmap(self.sequence.width(), self.sequence.height(), format);
        bitmap.set_pixels(&self.state.canvas);
        Ok(bitmap)
    }

    /// Renders frame `index`, recognizes its timestamp and records it on the
    /// frame. A timestamp recorded earlier wins.
    pub fn assign_timestamp<F>(&mut self, index: usize, ocr: F) -> Result<i64>
    where
        F: FnOnce(&dyn Pixels) -> i64,
    {
        self.decode_frame(index)?;
        let timestamp = ocr(&self.pixels());

        let frame = &self.sequence.frames()[index];
        if !frame.set_timestamp(timestamp) {
            debug!("frame {} already has a timestamp", index);
        }
        Ok(frame.timestamp().unwrap_or(timestamp))
    }

    fn composite(&mut self, index: usize) -> Result<()> {
        let sequence = self.sequence;
        let frame = &sequence.frames()[index];
        let previous = index.checked_sub(1).map(|previous| &sequence.frames()[previous]);

        let DecoderState { lzw, indices, canvas, scratch_table } = &mut self.state;

        if index == 0 {
            canvas.fill(TRANSPARENT_BLACK);
        }

        // Set the appropriate color table.
        let table = frame
            .local_color_table()
            .or(sequence.global_color_table())
            .ok_or(GifError::MissingColorTable { frame: index })?;
        let active_table = match frame.transparent_index() {
            Some(transparent_index) => {
                // never modify the shared table, later frames may use it without transparency
                scratch_table.copy_from(table);
                scratch_table.set(transparent_index, TRANSPARENT_BLACK);
                &*scratch_table
            }
            None => table,
        };

        if let Some(previous) = previous {
            match previous.disposal_method() {
                DisposalMethod::RestoreToPrevious => {
                    return Err(GifError::RestoreToPreviousUnsupported { frame: index });
                }
                DisposalMethod::RestoreToBackgroundColor => {
                    // a local table may reuse the background index as its transparent slot
                    let clears = frame.transparency
                        || (frame.local_color_table.is_some()
                            && sequence.screen().background_index == frame.transparent_index);
                    let color = if clears {
                        TRANSPARENT_BLACK
                    } else {
                        sequence.background_color()
                    };
                    fill_rect(canvas, sequence, previous, color);
                }
                DisposalMethod::DoNotDispose => {}
            }
        }

        let pixel_count = usize::from(frame.width) * usize::from(frame.height);
        let frame_indices = &mut indices[..pixel_count];
        let status = lzw_decode(
            sequence.compressed_data(frame),
            frame.lzw_min_code_size(),
            lzw,
            frame_indices,
        );
        let decoded = match status {
            LzwStatus::Complete => pixel_count,
            LzwStatus::Partial { decoded } => {
                warn!("frame {} decoded only {} of {} pixels", index, decoded, pixel_count);
                self.status = DecodeStatus::PartialDecode;
                decoded
            }
        };

        let saw_transparent = blit(canvas, sequence, frame, &frame_indices[..decoded], active_table);
        if index == 0 && self.first_frame_transparent.is_none() {
            self.first_frame_transparent = Some(saw_transparent);
        }
        Ok(())
    }
}

impl<A: Allocator> Drop for GifDecoder<'_, A> {
    fn drop(&mut self) {
        self.state.release(&self.allocator);
        self.allocator.dispose();
    }
}

/// Paints `frame`'s rectangle, clipped to the canvas, with `color`.
fn fill_rect(canvas: &mut [Argb], sequence: &FrameSequence, frame: &FrameDescriptor, color: Argb) {
    let canvas_width = usize::from(sequence.width());
    let canvas_height = usize::from(sequence.height());
    let left = usize::from(frame.left).min(canvas_width);
    let right = (left + usize::from(frame.width)).min(canvas_width);
    let top = usize::from(frame.top).min(canvas_height);
    let bottom = (top + usize::from(frame.height)).min(canvas_height);
    if left == right {
        return;
    }

    for row in canvas.chunks_exact_mut(canvas_width).take(bottom).skip(top) {
        row[left..right].fill(color);
    }
}

/// Copies a frame's decoded indices into its rectangle of the canvas.
///
/// Indices that resolve to transparent black leave the canvas untouched.
/// Pixels past the end of a short `indices` become transparent black.
/// Returns whether any transparent pixel was seen.
fn blit(
    canvas: &mut [Argb],
    sequence: &FrameSequence,
    frame: &FrameDescriptor,
    indices: &[u8],
    table: &ColorTable,
) -> bool {
    let canvas_width = usize::from(sequence.width());
    let canvas_height = usize::from(sequence.height());
    let frame_width = usize::from(frame.width);
    let frame_height = usize::from(frame.height);
    let left = usize::from(frame.left);
    let top = usize::from(frame.top);
    let colors = table.as_array();

    if frame_width == 0 || left >= canvas_width {
        return false;
    }
    let visible_width = frame_width.min(canvas_width - left);

    let mut saw_transparent = false;
    let mut copy_row = |source_row: usize, line: usize| {
        let y = line + top;
        if y >= canvas_height {
            return;
        }
        let row_start = source_row * frame_width;
        let dest = &mut canvas[y * canvas_width + left..][..visible_width];
        for (x, dest) in dest.iter_mut().enumerate() {
            let Some(&index) = indices.get(row_start + x) else {
                *dest = TRANSPARENT_BLACK;
                saw_transparent = true;
                continue;
            };
            let color = colors[index as usize];
            if color != TRANSPARENT_BLACK {
                *dest = color;
            } else {
                saw_transparent = true;
            }
        }
    };

    if frame.interlace {
        for (source_row, line) in interlaced_rows(frame_height).enumerate() {
            copy_row(source_row, line);
        }
    } else {
        for line in 0..frame_height {
            copy_row(line, line);
        }
    }
    saw_transparent
}

impl FrameSequence {
    pub fn decoder<A: Allocator>(&self, allocator: A) -> GifDecoder<'_, A> {
        GifDecoder::new(self, allocator)
    }

    /// Renders every frame in order and records the timestamp `ocr`
    /// recognizes on it.
    pub fn assign_timestamps<A, F>(&self, allocator: A, mut ocr: F) -> Result<()>
    where
        A: Allocator,
        F: FnMut(&dyn Pixels) -> i64,
    {
        let mut decoder = self.decoder(allocator);
        for index in 0..self.frame_count() {
            decoder.assign_timestamp(index, &mut ocr)?;
        }
        Ok(())
    }
}
