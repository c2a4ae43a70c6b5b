use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use super::bitmap::{Bitmap, PixelFormat};

/// Source of reusable buffers for decoders.
///
/// Buffers handed out may hold stale contents from an earlier user.
pub trait Allocator {
    fn obtain_bytes(&self, size: usize) -> Vec<u8>;
    fn release_bytes(&self, bytes: Vec<u8>);

    fn obtain_ints(&self, size: usize) -> Vec<u32>;
    fn release_ints(&self, ints: Vec<u32>);

    fn obtain_bitmap(&self, width: u16, height: u16, format: PixelFormat) -> Bitmap;
    fn release_bitmap(&self, bitmap: Bitmap);

    /// Called once by a decoder after it has released all of its buffers.
    fn dispose(&self) {}
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn obtain_bytes(&self, size: usize) -> Vec<u8> {
        (**self).obtain_bytes(size)
    }

    fn release_bytes(&self, bytes: Vec<u8>) {
        (**self).release_bytes(bytes)
    }

    fn obtain_ints(&self, size: usize) -> Vec<u32> {
        (**self).obtain_ints(size)
    }

    fn release_ints(&self, ints: Vec<u32>) {
        (**self).release_ints(ints)
    }

    fn obtain_bitmap(&self, width: u16, height: u16, format: PixelFormat) -> Bitmap {
        (**self).obtain_bitmap(width, height, format)
    }

    fn release_bitmap(&self, bitmap: Bitmap) {
        (**self).release_bitmap(bitmap)
    }

    fn dispose(&self) {
        (**self).dispose()
    }
}

impl<A: Allocator + ?Sized> Allocator for Arc<A> {
    fn obtain_bytes(&self, size: usize) -> Vec<u8> {
        (**self).obtain_bytes(size)
    }

    fn release_bytes(&self, bytes: Vec<u8>) {
        (**self).release_bytes(bytes)
    }

    fn obtain_ints(&self, size: usize) -> Vec<u32> {
        (**self).obtain_ints(size)
    }

    fn release_ints(&self, ints: Vec<u32>) {
        (**self).release_ints(ints)
    }

    fn obtain_bitmap(&self, width: u16, height: u16, format: PixelFormat) -> Bitmap {
        (**self).obtain_bitmap(width, height, format)
    }

    fn release_bitmap(&self, bitmap: Bitmap) {
        (**self).release_bitmap(bitmap)
    }

    fn dispose(&self) {
        (**self).dispose()
    }
}

/// Allocates fresh buffers every time and drops released ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl Allocator for HeapAllocator {
    fn obtain_bytes(&self, size: usize) -> Vec<u8> {
        vec![0; size]
    }

    fn release_bytes(&self, _bytes: Vec<u8>) {}

    fn obtain_ints(&self, size: usize) -> Vec<u32> {
        vec![0; size]
    }

    fn release_ints(&self, _ints: Vec<u32>) {}

    fn obtain_bitmap(&self, width: u16, height: u16, format: PixelFormat) -> Bitmap {
        Bitmap::new(width, height, format)
    }

    fn release_bitmap(&self, _bitmap: Bitmap) {}
}

/// Thread-safe pool keeping released buffers in per-size free lists.
#[derive(Debug, Default)]
pub struct FreeLists {
    bitmaps: Mutex<HashMap<(u16, u16), Vec<Bitmap>>>,
    bytes: Mutex<HashMap<usize, Vec<Vec<u8>>>>,
    ints: Mutex<HashMap<usize, Vec<Vec<u32>>>>,
}

impl FreeLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pooled buffers of every kind, for diagnostics.
    pub fn pooled(&self) -> usize {
        let bitmaps: usize = lock(&self.bitmaps).values().map(Vec::len).sum();
        let bytes: usize = lock(&self.bytes).values().map(Vec::len).sum();
        let ints: usize = lock(&self.ints).values().map(Vec::len).sum();
        bitmaps + bytes + ints
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Allocator for FreeLists {
    fn obtain_bytes(&self, size: usize) -> Vec<u8> {
        debug!("obtain {} bytes", size);
        lock(&self.bytes)
            .get_mut(&size)
            .and_then(Vec::pop)
            .unwrap_or_else(|| vec![0; size])
    }

    fn release_bytes(&self, bytes: Vec<u8>) {
        debug!("release {} bytes", bytes.len());
        if bytes.is_empty() {
            return;
        }
        lock(&self.bytes).entry(bytes.len()).or_default().push(bytes);
    }

    fn obtain_ints(&self, size: usize) -> Vec<u32> {
        debug!("obtain {} ints", size);
        lock(&self.ints)
            .get_mut(&size)
            .and_then(Vec::pop)
            .unwrap_or_else(|| vec![0; size])
    }

    fn release_ints(&self, ints: Vec<u32>) {
        debug!("release {} ints", ints.len());
        if ints.is_empty() {
            return;
        }
        lock(&self.ints).entry(ints.len()).or_default().push(ints);
    }

    fn obtain_bitmap(&self, width: u16, height: u16, format: PixelFormat) -> Bitmap {
        debug!("obtain {}x{} bitmap", width, height);
        match lock(&self.bitmaps).get_mut(&(width, height)).and_then(Vec::pop) {
            Some(mut bitmap) => {
                bitmap.set_format(format);
                bitmap
            }
            None => Bitmap::new(width, height, format),
        }
    }

    fn release_bitmap(&self, bitmap: Bitmap) {
        let key = bitmap.dimensions();
        debug!("release {}x{} bitmap", key.0, key.1);
        lock(&self.bitmaps).entry(key).or_default().push(bitmap);
    }
}
