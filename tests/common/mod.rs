//! Byte-level GIF construction for the integration tests.
#![allow(dead_code)]

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
pub const RED: [u8; 3] = [0xff, 0, 0];
pub const GREEN: [u8; 3] = [0, 0xff, 0];
pub const BLUE: [u8; 3] = [0, 0, 0xff];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Opaque ARGB value of an RGB triple.
pub fn argb([r, g, b]: [u8; 3]) -> u32 {
    0xff00_0000 | u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)
}

/// Packs LSB-first codes of a fixed width.
struct BitWriter {
    bytes: Vec<u8>,
    current: u32,
    bits: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self { bytes: Vec::new(), current: 0, bits: 0 }
    }

    fn write(&mut self, code: u16, width: u32) {
        self.current |= u32::from(code) << self.bits;
        self.bits += width;
        while self.bits >= 8 {
            self.bytes.push(self.current as u8);
            self.current >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push(self.current as u8);
        }
        self.bytes
    }
}

/// Encodes indices as literal codes only, clearing the dictionary before it
/// would widen the codes.
pub fn lzw_encode(indices: &[u8], minimum_code_size: u8) -> Vec<u8> {
    let clear: u16 = 1 << minimum_code_size;
    let width = u32::from(minimum_code_size) + 1;
    let run = usize::from(clear) - 2;

    let mut writer = BitWriter::new();
    for chunk in indices.chunks(run) {
        writer.write(clear, width);
        for &index in chunk {
            writer.write(u16::from(index), width);
        }
    }
    writer.write(clear + 1, width);
    writer.finish()
}

/// Splits data into a sub-block chain, terminator included.
pub fn sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut chain = Vec::new();
    for block in data.chunks(255) {
        chain.push(block.len() as u8);
        chain.extend_from_slice(block);
    }
    chain.push(0);
    chain
}

fn color_table(palette: &[[u8; 3]]) -> (u8, Vec<u8>) {
    let len = palette.len().next_power_of_two().max(2);
    let size_field = len.trailing_zeros() as u8 - 1;
    let mut table: Vec<u8> = palette.iter().flatten().copied().collect();
    table.resize(3 * len, 0);
    (size_field, table)
}

fn minimum_code_size(palette_len: usize) -> u8 {
    (palette_len.next_power_of_two().trailing_zeros() as u8).max(2)
}

/// Row order an interlaced image is stored in.
pub fn interlaced_rows(height: usize) -> Vec<usize> {
    [(0, 8), (4, 8), (2, 4), (1, 2)]
        .into_iter()
        .flat_map(|(start, step)| (start..height).step_by(step))
        .collect()
}

#[derive(Debug, Clone)]
pub struct Frame {
    left: u16,
    top: u16,
    width: u16,
    height: u16,
    indices: Vec<u8>,
    delay: u16,
    disposal: u8,
    transparent: Option<u8>,
    interlace: bool,
    local_palette: Option<Vec<[u8; 3]>>,
    control: bool,
    raw_data: Option<Vec<u8>>,
}

impl Frame {
    /// A frame at the canvas origin; `indices` in display order.
    pub fn new(width: u16, height: u16, indices: &[u8]) -> Self {
        assert_eq!(indices.len(), usize::from(width) * usize::from(height));
        Self {
            left: 0,
            top: 0,
            width,
            height,
            indices: indices.to_vec(),
            delay: 10,
            disposal: 0,
            transparent: None,
            interlace: false,
            local_palette: None,
            control: true,
            raw_data: None,
        }
    }

    /// A `width` x `height` frame of one index.
    pub fn filled(width: u16, height: u16, index: u8) -> Self {
        Self::new(width, height, &vec![index; usize::from(width) * usize::from(height)])
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn delay(mut self, delay: u16) -> Self {
        self.delay = delay;
        self
    }

    pub fn disposal(mut self, disposal: u8) -> Self {
        self.disposal = disposal;
        self
    }

    pub fn transparent(mut self, index: u8) -> Self {
        self.transparent = Some(index);
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlace = true;
        self
    }

    pub fn local_palette(mut self, palette: &[[u8; 3]]) -> Self {
        self.local_palette = Some(palette.to_vec());
        self
    }

    pub fn without_control(mut self) -> Self {
        self.control = false;
        self
    }

    /// Replaces the encoded image data (everything after the code size byte).
    pub fn raw_data(mut self, chain: &[u8]) -> Self {
        self.raw_data = Some(chain.to_vec());
        self
    }

    fn write(&self, out: &mut Vec<u8>, global_len: usize) {
        if self.control {
            let packed = self.disposal << 2 | u8::from(self.transparent.is_some());
            out.extend_from_slice(&[0x21, 0xf9, 4, packed]);
            out.extend_from_slice(&self.delay.to_le_bytes());
            out.extend_from_slice(&[self.transparent.unwrap_or(0), 0]);
        }

        out.push(0x2c);
        for field in [self.left, self.top, self.width, self.height] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        let mut packed = if self.interlace { 0b0100_0000 } else { 0 };
        let palette_len = match &self.local_palette {
            Some(palette) => {
                let (size_field, table) = color_table(palette);
                packed |= 0b1000_0000 | size_field;
                out.push(packed);
                out.extend_from_slice(&table);
                palette.len()
            }
            None => {
                out.push(packed);
                global_len
            }
        };

        let code_size = minimum_code_size(palette_len);
        out.push(code_size);
        match &self.raw_data {
            Some(chain) => out.extend_from_slice(chain),
            None => {
                let width = usize::from(self.width);
                let stored: Vec<u8> = if self.interlace {
                    interlaced_rows(usize::from(self.height))
                        .into_iter()
                        .flat_map(|row| self.indices[row * width..(row + 1) * width].to_vec())
                        .collect()
                } else {
                    self.indices.clone()
                };
                out.extend_from_slice(&sub_blocks(&lzw_encode(&stored, code_size)));
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Item {
    Frame(Frame),
    Comment(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct GifBuilder {
    width: u16,
    height: u16,
    palette: Option<Vec<[u8; 3]>>,
    background: u8,
    loop_count: Option<u16>,
    items: Vec<Item>,
}

impl GifBuilder {
    /// A canvas with a black and white global color table.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            palette: Some(vec![BLACK, WHITE]),
            background: 0,
            loop_count: None,
            items: Vec::new(),
        }
    }

    pub fn palette(mut self, palette: &[[u8; 3]]) -> Self {
        self.palette = Some(palette.to_vec());
        self
    }

    pub fn without_palette(mut self) -> Self {
        self.palette = None;
        self
    }

    pub fn background(mut self, index: u8) -> Self {
        self.background = index;
        self
    }

    pub fn loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = Some(loop_count);
        self
    }

    pub fn frame(mut self, frame: Frame) -> Self {
        self.items.push(Item::Frame(frame));
        self
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.items.push(Item::Comment(text.as_bytes().to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = b"GIF89a".to_vec();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let global_len = match &self.palette {
            Some(palette) => {
                let (size_field, table) = color_table(palette);
                out.extend_from_slice(&[0b1000_0000 | size_field, self.background, 0]);
                out.extend_from_slice(&table);
                palette.len()
            }
            None => {
                out.extend_from_slice(&[0, self.background, 0]);
                2
            }
        };

        if let Some(loop_count) = self.loop_count {
            out.extend_from_slice(&[0x21, 0xff, 11]);
            out.extend_from_slice(b"NETSCAPE2.0");
            out.extend_from_slice(&[3, 1]);
            out.extend_from_slice(&loop_count.to_le_bytes());
            out.push(0);
        }

        for item in &self.items {
            match item {
                Item::Frame(frame) => frame.write(&mut out, global_len),
                Item::Comment(text) => {
                    out.extend_from_slice(&[0x21, 0xfe]);
                    out.extend_from_slice(&sub_blocks(text));
                }
            }
        }
        out.push(0x3b);
        out
    }
}

/// Frame delays as stored in the stream, in hundredths of a second.
pub fn delays(gif: &[u8]) -> Vec<u16> {
    gifseq::FrameSequence::parse(gif.to_vec())
        .expect("valid gif")
        .frames()
        .iter()
        .map(|frame| frame.delay_centiseconds())
        .collect()
}
