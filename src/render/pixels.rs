use crate::parser::{blue, green, red, Argb};

const ASCII_GRAYSCALE: &[u8] = b"@%#*+=-:. ";
const MAX_PIXEL_VALUE: usize = 3 * 0xff;

pub fn argb_to_gray(color: Argb) -> usize {
    usize::from(red(color)) + usize::from(green(color)) + usize::from(blue(color))
}

/// Read-only view of a rendered image, handed to timestamp recognition.
pub trait Pixels {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn get(&self, x: usize, y: usize) -> Argb;

    fn ascii_pixel(&self, x: usize, y: usize) -> char {
        let index = argb_to_gray(self.get(x, y)) * ASCII_GRAYSCALE.len() / MAX_PIXEL_VALUE;
        ASCII_GRAYSCALE[index.min(ASCII_GRAYSCALE.len() - 1)] as char
    }
}

/// A canvas of packed colors, row-major.
#[derive(Debug, Clone, Copy)]
pub struct CanvasPixels<'a> {
    pixels: &'a [Argb],
    width: usize,
}

impl<'a> CanvasPixels<'a> {
    pub fn new(pixels: &'a [Argb], width: usize) -> Self {
        Self { pixels, width }
    }

    pub fn as_slice(&self) -> &'a [Argb] {
        self.pixels
    }
}

impl Pixels for CanvasPixels<'_> {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.pixels.len().checked_div(self.width).unwrap_or(0)
    }

    fn get(&self, x: usize, y: usize) -> Argb {
        self.pixels[self.width * y + x]
    }
}
