/// A color packed as `0xAARRGGBB`.
pub type Argb = u32;

pub const TRANSPARENT_BLACK: Argb = 0x0000_0000;

const OPAQUE: Argb = 0xff00_0000;

pub fn rgb(red: u8, green: u8, blue: u8) -> Argb {
    OPAQUE | u32::from(red) << 16 | u32::from(green) << 8 | u32::from(blue)
}

pub fn red(color: Argb) -> u8 {
    (color >> 16) as u8
}

pub fn green(color: Argb) -> u8 {
    (color >> 8) as u8
}

pub fn blue(color: Argb) -> u8 {
    color as u8
}

pub fn alpha(color: Argb) -> u8 {
    (color >> 24) as u8
}

/// Up to 256 opaque colors decoded from packed RGB triples.
///
/// Storage always holds 256 entries so any palette index can be looked up
/// without a bounds check; entries past `len()` are transparent black.
#[derive(Clone, PartialEq, Eq)]
pub struct ColorTable {
    colors: Box<[Argb; 256]>,
    len: usize,
}

impl ColorTable {
    /// `rgb_triples` must hold a whole number of triples, at most 256 of them.
    pub fn from_rgb(rgb_triples: &[u8]) -> Self {
        debug_assert!(rgb_triples.len() % 3 == 0 && rgb_triples.len() <= 3 * 256);

        let mut colors = Box::new([TRANSPARENT_BLACK; 256]);
        for (color, triple) in colors.iter_mut().zip(rgb_triples.chunks_exact(3)) {
            *color = rgb(triple[0], triple[1], triple[2]);
        }
        Self { colors, len: rgb_triples.len() / 3 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: u8) -> Argb {
        self.colors[index as usize]
    }

    pub fn as_array(&self) -> &[Argb; 256] {
        &self.colors
    }

    /// Replaces the contents of `self` with `other`, reusing the storage.
    pub fn copy_from(&mut self, other: &ColorTable) {
        self.colors.copy_from_slice(&other.colors[..]);
        self.len = other.len;
    }

    pub fn set(&mut self, index: u8, color: Argb) {
        self.colors[index as usize] = color;
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self { colors: Box::new([TRANSPARENT_BLACK; 256]), len: 0 }
    }
}

impl std::fmt::Debug for ColorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorTable").field("len", &self.len).finish()
    }
}
