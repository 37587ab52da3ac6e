#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod checksum;
pub mod constants;
pub mod control_table;
pub mod crc;
pub mod id;
pub mod instruction;
pub mod parse;
pub mod v1;
pub mod v2;

use {alloc::vec::Vec, core::fmt};

pub use {id::Id, instruction::Instruction};

/// Wire-protocol generation spoken by a device.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Generation {
    V1,
    V2,
}

impl fmt::Display for Generation {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::V1 => f.write_str("protocol 1.0"),
            Self::V2 => f.write_str("protocol 2.0"),
        }
    }
}

/// Byte layout of one protocol generation: instruction encoding, status parsing,
/// and how addresses are packed into parameters.
pub trait Framing {
    const GENERATION: Generation;

    /// Decoded (nonzero) error byte of a status packet.
    type Error: Copy + fmt::Debug + fmt::Display;
    type Parser: parse::State<Output = StatusPacket<Self::Error>, Error = FrameError>;

    fn instruction(
        id: Id,
        instruction: Instruction,
        parameters: &[u8],
    ) -> Result<Vec<u8>, EncodeError>;

    /// Device-side decoding of a complete instruction frame. Unlike status
    /// parsing, the checksum is always verified here.
    fn decode_instruction(frame: &[u8]) -> Result<InstructionPacket, FrameError>;

    fn parser() -> Self::Parser;

    fn read_parameters(address: u16, length: u16) -> Result<Vec<u8>, EncodeError>;

    fn write_parameters(address: u16, data: &[u8]) -> Result<Vec<u8>, EncodeError>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusPacket<E> {
    /// Raw ID byte; compared against the addressed device by the caller.
    pub id: u8,
    /// `None` iff the error byte was zero.
    pub error: Option<E>,
    pub parameters: Vec<u8>,
    pub checksum: u16,
    pub expected_checksum: u16,
}

impl<E> StatusPacket<E> {
    #[inline(always)]
    pub fn checksum_matches(&self) -> bool {
        self.checksum == self.expected_checksum
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstructionPacket {
    pub id: u8,
    pub instruction: u8,
    pub parameters: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error("wrong header byte #{index}: expected 0x{expected:02X} but received 0x{actual:02X}")]
    Header { index: u8, expected: u8, actual: u8 },
    #[error(
        "wrong status instruction: expected 0x{status:02X} but received 0x{actual:02X}",
        status = constants::STATUS
    )]
    Instruction { actual: u8 },
    #[error("length field {length} is shorter than the fixed part of a packet")]
    Length { length: u16 },
    #[error("packet ends after {actual} of {expected} bytes")]
    Truncated { expected: usize, actual: usize },
    #[error("expected {expected} parameter bytes but received {actual}")]
    ParameterCount { expected: usize, actual: usize },
    #[error("checksum mismatch: computed 0x{expected:04X} but received 0x{actual:04X}")]
    Checksum { expected: u16, actual: u16 },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum EncodeError {
    #[error("{count} parameter bytes do not fit in one packet (at most {max})")]
    TooManyParameters { count: usize, max: usize },
    #[error("address 0x{0:04X} is too wide for this protocol")]
    Address(u16),
    #[error("read length {0} is too long for this protocol")]
    Length(u16),
}
