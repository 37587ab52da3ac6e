//! CRC-16 of protocol 2.0 (polynomial `0x8005`, no reflection, zero initial value).

const POLYNOMIAL: u16 = 0x8005;

const TABLE: [u16; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ POLYNOMIAL
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Crc(u16);

impl Crc {
    #[inline(always)]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline(always)]
    pub const fn push(&mut self, byte: u8) {
        let i = ((self.0 >> 8) as u8 ^ byte) as usize;
        self.0 = (self.0 << 8) ^ TABLE[i];
    }

    #[inline]
    pub const fn recurse_over_bytes(mut self, bytes: &[u8]) -> Self {
        let mut i = 0;
        while i < bytes.len() {
            self.push(bytes[i]);
            i += 1;
        }
        self
    }

    #[inline(always)]
    pub const fn collapse(self) -> u16 {
        self.0
    }
}

/// CRC of every byte from the header through the last parameter.
#[inline]
pub const fn crc(bytes: &[u8]) -> u16 {
    Crc::new().recurse_over_bytes(bytes).collapse()
}
