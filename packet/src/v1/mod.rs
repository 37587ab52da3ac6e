//! Protocol 1.0: `FF FF | id | length | instruction/error | parameters | checksum`.

mod instruction;
mod status;

pub use {
    instruction::{MAX_PARAMETERS, decode, encode},
    status::{Alarm, Parser, StatusError},
};

use {
    crate::{EncodeError, FrameError, Framing, Generation, Id, Instruction, InstructionPacket},
    alloc::{vec, vec::Vec},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct V1;

impl Framing for V1 {
    const GENERATION: Generation = Generation::V1;

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
        let address = u8::try_from(address).map_err(|_| EncodeError::Address(address))?;
        let length = u8::try_from(length).map_err(|_| EncodeError::Length(length))?;
        Ok(vec![address, length])
    }

    #[inline]
    fn write_parameters(address: u16, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let address = u8::try_from(address).map_err(|_| EncodeError::Address(address))?;
        let mut parameters = Vec::with_capacity(data.len() + 1);
        parameters.push(address);
        parameters.extend_from_slice(data);
        Ok(parameters)
    }
}
