use log::{debug, info};

use crate::error::{GifError, Result};
use crate::parser::*;

/// A 16-bit field write deferred until the end of the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingPatch {
    offset: usize,
    value: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetimeSummary {
    /// Number of graphic control extensions whose delay was rewritten.
    pub delays_patched: usize,
    /// Number of Netscape loop counts rewritten.
    pub loop_counts_patched: usize,
}

/// Rewrites every frame delay to `delay` and the Netscape loop count to
/// `loop_count`, in place. The last frame's delay becomes `last_frame_hold`.
///
/// Delays are in hundredths of a second. Nothing but those fields changes and
/// the buffer keeps its length. A malformed stream fails with a format error
/// and may be left partly patched.
pub fn retime(
    buf: &mut [u8],
    delay: u16,
    last_frame_hold: u16,
    loop_count: u16,
) -> Result<RetimeSummary> {
    let mut scanner = BlockScanner::new(buf);
    scanner.read_signature()?;
    scanner.skip_screen_descriptor()?;

    let mut summary = RetimeSummary::default();
    let mut last_delay: Option<PendingPatch> = None;

    loop {
        match scanner.next_block()? {
            Block::Extension(ExtensionType::GraphicControl) => {
                scanner.expect_block_size("graphic control extension", GRAPHIC_CONTROL_BLOCK_SIZE)?;
                scanner.skip(1)?; // packed fields

                let offset = scanner.position();
                scanner.skip(2)?;
                scanner.write_u16_at(offset, delay);
                last_delay = Some(PendingPatch { offset, value: last_frame_hold });
                summary.delays_patched += 1;

                scanner.skip(1)?; // transparent color index
                scanner.expect_terminator()?;
            }
            Block::Extension(ExtensionType::Application) => {
                scanner.expect_block_size("application extension", APPLICATION_BLOCK_SIZE)?;
                if scanner.read_bytes(11)? != NETSCAPE_IDENTIFIER {
                    scanner.skip_sub_blocks()?;
                    continue;
                }
                summary.loop_counts_patched += patch_netscape_loop_count(&mut scanner, loop_count)?;
            }
            Block::Extension(_) => {
                scanner.skip_sub_blocks()?;
            }
            Block::ImageDescriptor => {
                scanner.skip(8)?; // image position and size
                let packed_fields = scanner.read_byte()?;
                scanner.skip_color_table(packed_fields)?;
                scanner.skip(1)?; // LZW minimum code size
                scanner.skip_sub_blocks()?;
            }
            Block::Trailer => break,
        }
    }

    if let Some(PendingPatch { offset, value }) = last_delay {
        debug!("last frame delay at {} set to {}", offset, value);
        scanner.write_u16_at(offset, value);
    }
    info!(
        "retimed {} frames to {} (last {}), {} loop counts set to {}",
        summary.delays_patched, delay, last_frame_hold, summary.loop_counts_patched, loop_count
    );
    Ok(summary)
}

/// Walks the sub-blocks of a Netscape application extension, overwriting the
/// loop count of its looping sub-block.
fn patch_netscape_loop_count(
    scanner: &mut BlockScanner<&mut [u8]>,
    loop_count: u16,
) -> Result<usize> {
    let mut patched = 0;
    loop {
        let offset = scanner.position();
        let len = scanner.read_byte()?;
        if len == 0 {
            return Ok(patched);
        }
        let sub_block_id = scanner.read_byte()?;
        if sub_block_id != NETSCAPE_LOOP_SUB_BLOCK_ID {
            scanner.skip(usize::from(len) - 1)?;
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
        let field = scanner.position();
        scanner.skip(2)?;
        scanner.write_u16_at(field, loop_count);
        patched += 1;
    }
}
