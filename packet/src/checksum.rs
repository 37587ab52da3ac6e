/// Running protocol 1.0 checksum: the low byte of the complemented sum.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Checksum(u8);

impl Checksum {
    #[inline(always)]
    pub const fn new() -> Self {
        Self(0)
    }

    #[inline(always)]
    pub const fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
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
    pub const fn collapse(self) -> u8 {
        !self.0
    }
}

/// Checksum of everything after the header and before the checksum byte.
#[inline]
pub const fn checksum(bytes: &[u8]) -> u8 {
    Checksum::new().recurse_over_bytes(bytes).collapse()
}
