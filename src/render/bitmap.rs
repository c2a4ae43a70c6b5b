use super::pixels::Pixels;
use crate::parser::{alpha, blue, green, red, Argb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel, stored as R, G, B, A.
    Argb8888,
    /// 2 bytes per pixel, little-endian 5-6-5, no alpha.
    Rgb565,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Argb8888 => 4,
            PixelFormat::Rgb565 => 2,
        }
    }
}

pub fn color565_from_rgb(r: u8, g: u8, b: u8) -> u16 {
    (r as u16 & 0xF8) << 8 | (g as u16 & 0xFC) << 3 | b as u16 >> 3
}

fn rgb_from_color565(color: u16) -> (u8, u8, u8) {
    (
        ((color & 0b1111100000000000) >> 8) as u8,
        ((color & 0b0000011111100000) >> 3) as u8,
        ((color & 0b0000000000011111) << 3) as u8,
    )
}

/// A rendered frame in a caller-visible pixel format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u16,
    height: u16,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u16, height: u16, format: PixelFormat) -> Self {
        let len = usize::from(width) * usize::from(height) * format.bytes_per_pixel();
        Self { width, height, format, data: vec![0; len] }
    }

    pub fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Switches the pixel format, reusing the storage when possible.
    pub fn set_format(&mut self, format: PixelFormat) {
        let len = usize::from(self.width) * usize::from(self.height) * format.bytes_per_pixel();
        self.data.resize(len, 0);
        self.format = format;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Copies a full canvas of `width * height` colors into the bitmap.
    pub fn set_pixels(&mut self, pixels: &[Argb]) {
        debug_assert_eq!(pixels.len(), usize::from(self.width) * usize::from(self.height));

        match self.format {
            PixelFormat::Argb8888 => {
                for (dest, &color) in self.data.chunks_exact_mut(4).zip(pixels) {
                    dest.copy_from_slice(&[red(color), green(color), blue(color), alpha(color)]);
                }
            }
            PixelFormat::Rgb565 => {
                for (dest, &color) in self.data.chunks_exact_mut(2).zip(pixels) {
                    let packed = color565_from_rgb(red(color), green(color), blue(color));
                    dest.copy_from_slice(&packed.to_le_bytes());
                }
            }
        }
    }
}

impl Pixels for Bitmap {
    fn width(&self) -> usize {
        self.width.into()
    }

    fn height(&self) -> usize {
        self.height.into()
    }

    fn get(&self, x: usize, y: usize) -> Argb {
        let offset = (y * usize::from(self.width) + x) * self.format.bytes_per_pixel();
        match self.format {
            PixelFormat::Argb8888 => {
                let [r, g, b, a] = [
                    self.data[offset],
                    self.data[offset + 1],
                    self.data[offset + 2],
                    self.data[offset + 3],
                ];
                u32::from(a) << 24 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
            }
            PixelFormat::Rgb565 => {
                let (r, g, b) =
                    rgb_from_color565(u16::from_le_bytes([self.data[offset], self.data[offset + 1]]));
                crate::parser::rgb(r, g, b)
            }
        }
    }
}
