//! In-place editing of GIF timing, looping and frame count.
//!
//! The editors work directly on the raw stream through the block scanner and
//! never decode pixels.

mod frame_ring;
mod retime;
mod trim;

pub use frame_ring::FrameRing;
pub use retime::{retime, RetimeSummary};
pub use trim::{check_gif, drop_leading_frames, edit_gif, TrimSummary};
