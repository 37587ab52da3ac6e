use {
    crate::{
        EncodeError, FrameError, Id, Instruction, InstructionPacket, checksum::Checksum,
        constants,
    },
    alloc::vec::Vec,
};

/// Largest parameter count whose length field still fits in one byte.
pub const MAX_PARAMETERS: usize = u8::MAX as usize - 2;

pub fn encode(id: Id, instruction: Instruction, parameters: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let Ok(length) = u8::try_from(parameters.len() + 2) else {
        return Err(EncodeError::TooManyParameters {
            count: parameters.len(),
            max: MAX_PARAMETERS,
        });
    };
    let mut frame = Vec::with_capacity(parameters.len() + 6);
    frame.extend_from_slice(&[
        constants::HEADER,
        constants::HEADER,
        id.get(),
        length,
        instruction.byte(),
    ]);
    frame.extend_from_slice(parameters);
    let checksum = Checksum::new().recurse_over_bytes(&frame[2..]).collapse();
    frame.push(checksum);
    Ok(frame)
}

pub fn decode(frame: &[u8]) -> Result<InstructionPacket, FrameError> {
    let [h0, h1, id, length, instruction, ref rest @ ..] = *frame else {
        return Err(FrameError::Truncated {
            expected: 6,
            actual: frame.len(),
        });
    };
    for (index, actual) in [h0, h1].into_iter().enumerate() {
        if actual != constants::HEADER {
            return Err(FrameError::Header {
                index: index as u8,
                expected: constants::HEADER,
                actual,
            });
        }
    }
    let Some(count) = length.checked_sub(2) else {
        return Err(FrameError::Length {
            length: length.into(),
        });
    };
    let count = usize::from(count);
    let Some((parameters, &[actual, ..])) = rest.split_at_checked(count) else {
        return Err(FrameError::Truncated {
            expected: count + 6,
            actual: frame.len(),
        });
    };
    let expected = Checksum::new()
        .recurse_over_bytes(&frame[2..5 + count])
        .collapse();
    if actual != expected {
        return Err(FrameError::Checksum {
            expected: expected.into(),
            actual: actual.into(),
        });
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
    fn write_goal_position() {
        let frame = encode(Id::new(1).unwrap(), Instruction::Write, &[0x1E, 0x00, 0x02]).unwrap();
        assert_eq!(frame, [0xFF, 0xFF, 0x01, 0x05, 0x03, 0x1E, 0x00, 0x02, 0xD6]);
    }

    #[test]
    fn ping() {
        let frame = encode(Id::new(1).unwrap(), Instruction::Ping, &[]).unwrap();
        assert_eq!(frame, [0xFF, 0xFF, 0x01, 0x02, 0x01, 0xFB]);
    }

    #[test]
    fn broadcast_action() {
        let frame = encode(Id::BROADCAST, Instruction::Action, &[]).unwrap();
        assert_eq!(frame, [0xFF, 0xFF, 0xFE, 0x02, 0x05, 0xFA]);
    }

    #[test]
    fn too_many_parameters() {
        let parameters = [0; MAX_PARAMETERS + 1];
        assert_eq!(
            encode(Id::new(1).unwrap(), Instruction::Write, &parameters),
            Err(EncodeError::TooManyParameters {
                count: MAX_PARAMETERS + 1,
                max: MAX_PARAMETERS,
            })
        );
        assert!(encode(Id::new(1).unwrap(), Instruction::Write, &parameters[1..]).is_ok());
    }

    #[quickcheck]
    fn encode_decode_roundtrip(id: u8, instruction: Instruction, parameters: Vec<u8>) -> TestResult {
        let (Ok(id), true) = (Id::new(id), parameters.len() <= MAX_PARAMETERS) else {
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
    fn decode_wrong_checksum() {
        let frame = [0xFF, 0xFF, 0x01, 0x02, 0x01, 0xFA];
        assert_eq!(
            decode(&frame),
            Err(FrameError::Checksum {
                expected: 0xFB,
                actual: 0xFA
            })
        );
    }

    #[test]
    fn decode_wrong_header() {
        let frame = [0xFF, 0xFE, 0x01, 0x02, 0x01, 0xFB];
        assert_eq!(
            decode(&frame),
            Err(FrameError::Header {
                index: 1,
                expected: 0xFF,
                actual: 0xFE
            })
        );
    }

    #[test]
    fn decode_truncated() {
        let frame = [0xFF, 0xFF, 0x01, 0x05, 0x03, 0x1E, 0x00];
        assert_eq!(
            decode(&frame),
            Err(FrameError::Truncated {
                expected: 9,
                actual: 7
            })
        );
    }
}
