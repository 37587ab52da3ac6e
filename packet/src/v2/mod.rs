//! Protocol 2.0: `FF FF FD 00 | id | length (LE) | instruction | parameters | CRC (LE)`.

mod instruction;
mod status;

pub use {
    instruction::{MAX_PARAMETERS, decode, encode},
    status::{ALERT, InvalidSoftwareError, Parser, SoftwareError, StatusError},
};

use {
    crate::{EncodeError, FrameError, Framing, Generation, Id, Instruction, InstructionPacket},
    alloc::vec::Vec,
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct V2;

impl Framing for V2 {
    const GENERATION: Generation = Generation::V2;

    type Error = StatusError;
    type Parser = Parser;

    #[inline(always)]
    fn instruction(
        id: Id,
        instruction: Instruction,
        parameters: &[u8],
    ) -> Result<Vec<u8>, EncodeError> {
        encode(id, instruction, parameters)
    }

    #[inline(always)]
    fn decode_instruction(frame: &[u8]) -> Result<InstructionPacket, FrameError> {
        decode(frame)
    }

    #[inline(always)]
    fn parser() -> Self::Parser {
        Parser::new()
    }

    #[inline]
    fn read_parameters(address: u16, length: u16) -> Result<Vec<u8>, EncodeError> {
        let mut parameters = Vec::with_capacity(4);
        parameters.extend_from_slice(&address.to_le_bytes());
        parameters.extend_from_slice(&length.to_le_bytes());
        Ok(parameters)
    }

    #[inline]
    fn write_parameters(address: u16, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let mut parameters = Vec::with_capacity(data.len() + 2);
        parameters.extend_from_slice(&address.to_le_bytes());
        parameters.extend_from_slice(data);
        Ok(parameters)
    }
}
