mod allocator;
mod bitmap;
mod compositor;
mod pixels;

pub use allocator::{Allocator, FreeLists, HeapAllocator};
pub use bitmap::{color565_from_rgb, Bitmap, PixelFormat};
pub use compositor::{DecodeStatus, GifDecoder};
pub use pixels::{argb_to_gray, CanvasPixels, Pixels};
