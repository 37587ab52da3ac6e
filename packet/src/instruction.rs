use core::fmt;

/// Instruction codes shared by both protocol generations.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(strum_macros::VariantArray))]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
    /// Like `Write`, but held on the device until `Action`.
    RegWrite = 0x04,
    Action = 0x05,
}

impl Instruction {
    #[inline(always)]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::Ping),
            0x02 => Some(Self::Read),
            0x03 => Some(Self::Write),
            0x04 => Some(Self::RegWrite),
            0x05 => Some(Self::Action),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Ping => "PING",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::RegWrite => "REG_WRITE",
            Self::Action => "ACTION",
        })
    }
}
