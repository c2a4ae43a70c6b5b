use super::bit_reader::BitReader;

/// Maximum number of entries in a GIF LZW dictionary.
pub const MAX_STACK_SIZE: usize = 4096;

/// Largest valid LZW minimum code size. Anything above would start the
/// code width past the 12 bit cap.
pub const MAX_MINIMUM_CODE_SIZE: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzwStatus {
    Complete,
    /// The code stream ended (or turned corrupt) after `decoded` pixels; the
    /// rest of the output was filled with index 0.
    Partial { decoded: usize },
}

/// Dictionary working arrays, allocated once and reused for every frame.
pub struct LzwTables {
    prefix: Box<[u16]>,
    suffix: Box<[u8]>,
    pixel_stack: Box<[u8]>,
}

impl LzwTables {
    pub fn new() -> Self {
        Self {
            prefix: vec![0; MAX_STACK_SIZE].into_boxed_slice(),
            suffix: vec![0; MAX_STACK_SIZE].into_boxed_slice(),
            pixel_stack: vec![0; MAX_STACK_SIZE + 1].into_boxed_slice(),
        }
    }
}

impl Default for LzwTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompresses one frame's sub-block chain into `output`, producing exactly
/// `output.len()` palette indices.
///
/// `chain` starts at the first sub-block length byte, just past the minimum
/// code size byte.
pub fn lzw_decode(
    chain: &[u8],
    minimum_code_size: u8,
    tables: &mut LzwTables,
    output: &mut [u8],
) -> LzwStatus {
    debug_assert!(minimum_code_size <= MAX_MINIMUM_CODE_SIZE);

    let npix = output.len();
    let LzwTables { prefix, suffix, pixel_stack } = tables;

    let clear_code: u16 = 1 << minimum_code_size;
    let end_of_information_code = clear_code + 1;

    let mut code_size = u32::from(minimum_code_size) + 1;
    let mut code_mask: u16 = (1 << code_size) - 1;
    let mut available = clear_code + 2;
    for code in 0..clear_code {
        prefix[code as usize] = 0;
        suffix[code as usize] = code as u8;
    }

    let mut reader = BitReader::new(chain);
    let mut old_code: Option<u16> = None;
    let mut first: u8 = 0;
    let mut top = 0;
    let mut pi = 0;

    'decode: while pi < npix {
        while top > 0 {
            top -= 1;
            output[pi] = pixel_stack[top];
            pi += 1;
            if pi == npix {
                break 'decode;
            }
        }

        let Some(code) = reader.next(code_size) else {
            break;
        };

        if code > available || code == end_of_information_code {
            break;
        }

        if code == clear_code {
            code_size = u32::from(minimum_code_size) + 1;
            code_mask = (1 << code_size) - 1;
            available = clear_code + 2;
            old_code = None;
            continue;
        }

        let Some(previous) = old_code else {
            // nothing is defined past the literals yet
            if code > clear_code {
                break;
            }
            first = suffix[code as usize];
            output[pi] = first;
            pi += 1;
            old_code = Some(code);
            continue;
        };

        let in_code = code;
        let mut code = code;
        if code == available {
            pixel_stack[top] = first;
            top += 1;
            code = previous;
        }
        while code > clear_code {
            if top == pixel_stack.len() {
                break 'decode;
            }
            pixel_stack[top] = suffix[code as usize];
            top += 1;
            code = prefix[code as usize];
        }
        first = suffix[code as usize];
        output[pi] = first;
        pi += 1;

        if usize::from(available) < MAX_STACK_SIZE {
            prefix[available as usize] = previous;
            suffix[available as usize] = first;
            available += 1;
            if available & code_mask == 0 && usize::from(available) < MAX_STACK_SIZE {
                code_size += 1;
                code_mask += available;
            }
        }
        old_code = Some(in_code);
    }

    if pi == npix {
        return LzwStatus::Complete;
    }
    output[pi..].fill(0);
    LzwStatus::Partial { decoded: pi }
}
