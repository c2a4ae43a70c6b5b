/// LSB-first bit reader fed by a GIF sub-block chain.
///
/// `buf` starts at the first length byte of the chain. Reading stops at the
/// zero length terminator or at the end of `buf`, whichever comes first.
pub struct BitReader<'a> {
    buf: &'a [u8],
    // byte position in `buf`
    position: usize,
    // bytes left in the current sub-block
    block_remaining: usize,
    datum: u32,
    bits: u32,
    exhausted: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: 0,
            block_remaining: 0,
            datum: 0,
            bits: 0,
            exhausted: false,
        }
    }

    fn next_data_byte(&mut self) -> Option<u8> {
        if self.exhausted {
            return None;
        }
        if self.block_remaining == 0 {
            let len = *self.buf.get(self.position)?;
            self.position += 1;
            if len == 0 {
                self.exhausted = true;
                return None;
            }
            self.block_remaining = len.into();
        }
        let Some(&byte) = self.buf.get(self.position) else {
            self.exhausted = true;
            return None;
        };
        self.position += 1;
        self.block_remaining -= 1;
        Some(byte)
    }

    /// Next `count` bits (at most 12) as a code, or `None` once the chain
    /// runs out before `count` bits are available.
    pub fn next(&mut self, count: u32) -> Option<u16> {
        debug_assert!(count <= 12);
        while self.bits < count {
            let byte = self.next_data_byte()?;
            self.datum |= u32::from(byte) << self.bits;
            self.bits += 8;
        }
        let value = (self.datum & ((1 << count) - 1)) as u16;
        self.datum >>= count;
        self.bits -= count;
        Some(value)
    }
}
