use {
    crate::{EncodeError, FrameError, Id, Instruction, InstructionPacket, constants, crc::Crc},
    alloc::vec::Vec,
};

/// Largest parameter count whose length field still fits in two bytes.
pub const MAX_PARAMETERS: usize = u16::MAX as usize - 3;

pub fn encode(id: Id, instruction: Instruction, parameters: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let Ok(length) = u16::try_from(parameters.len() + 3) else {
        return Err(EncodeError::TooManyParameters {
            count: parameters.len(),
            max: MAX_PARAMETERS,
        });
    };
    let mut frame = Vec::with_capacity(parameters.len() + 10);
    frame.extend_from_slice(&constants::V2_HEADER);
    frame.push(id.get());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.push(instruction.byte());
    frame.extend_from_slice(parameters);
    let crc = Crc::new().recurse_over_bytes(&frame).collapse();
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

pub fn decode(frame: &[u8]) -> Result<InstructionPacket, FrameError> {
    let [h0, h1, h2, _reserved, id, l0, l1, instruction, ref rest @ ..] = *frame else {
        return Err(FrameError::Truncated {
            expected: 10,
            actual: frame.len(),
        });
    };
    for (index, (actual, expected)) in [h0, h1, h2].into_iter().zip(constants::V2_HEADER).enumerate()
    {
        if actual != expected {
            return Err(FrameError::Header {
                index: index as u8,
                expected,
                actual,
            });
        }
    }
    let length = u16::from_le_bytes([l0, l1]);
    let Some(count) = length.checked_sub(3) else {
        return Err(FrameError::Length { length });
    };
    let count = usize::from(count);
    let Some((parameters, &[c0, c1, ..])) = rest.split_at_checked(count) else {
        return Err(FrameError::Truncated {
            expected: count + 10,
            actual: frame.len(),
        });
    };
    let actual = u16::from_le_bytes([c0, c1]);
    let expected = Crc::new().recurse_over_bytes(&frame[..8 + count]).collapse();
    if actual != expected {
        return Err(FrameError::Checksum { expected, actual });
    }
    Ok(InstructionPacket {
        id,
        instruction,
        parameters: parameters.to_vec(),
    })
}

#[cfg(test)]
mod test {
    use {super::*, quickcheck::TestResult, quickcheck_macros::quickcheck};

    #[test]
    fn write_data() {
        let frame = encode(Id::new(1).unwrap(), Instruction::Write, &[0x02, 0x00, 0x03, 0x04, 0x05]).unwrap();
        assert_eq!(
            frame,
            [
                0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x08, 0x00, 0x03, 0x02, 0x00, 0x03, 0x04, 0x05,
                0x3D, 0x30
            ]
        );
    }

    #[test]
    fn ping() {
        let frame = encode(Id::new(1).unwrap(), Instruction::Ping, &[]).unwrap();
        assert_eq!(frame, [0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]);
    }

    #[quickcheck]
    fn encode_decode_roundtrip(id: u8, instruction: Instruction, parameters: Vec<u8>) -> TestResult {
        let Ok(id) = Id::new(id) else {
            return TestResult::discard();
        };
        let frame = match encode(id, instruction, &parameters) {
            Ok(ok) => ok,
            Err(e) => return TestResult::error(format!("{e}")),
        };
        let expected = InstructionPacket {
            id: id.get(),
            instruction: instruction.byte(),
            parameters,
        };
        match decode(&frame) {
            Ok(actual) if actual == expected => TestResult::passed(),
            other => TestResult::error(format!("{frame:02X?} -> {other:02X?} =/= {expected:02X?}")),
        }
    }

    #[test]
    fn decode_wrong_crc() {
        let frame = [0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x4E, 0x19];
        assert_eq!(
            decode(&frame),
            Err(FrameError::Checksum {
                expected: 0x4E19,
                actual: 0x194E
            })
        );
    }

    #[test]
    fn decode_wrong_third_header_byte() {
        let frame = [0xFF, 0xFF, 0xFC, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E];
        assert_eq!(
            decode(&frame),
            Err(FrameError::Header {
                index: 2,
                expected: 0xFD,
                actual: 0xFC
            })
        );
    }

    #[test]
    fn decode_short_length() {
        let frame = [0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x02, 0x00, 0x01, 0x00, 0x00];
        assert_eq!(decode(&frame), Err(FrameError::Length { length: 2 }));
    }
}
