use {
    crate::{
        FrameError, StatusPacket, constants,
        crc::Crc,
        parse::{State, Status},
    },
    alloc::vec::Vec,
    core::fmt,
};

/// Most significant bit of the error byte: something is set in "Hardware Error Status".
pub const ALERT: u8 = 0x80;

#[repr(u8)]
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(strum_macros::VariantArray))]
pub enum SoftwareError {
    ResultFail = 0x01,
    InstructionError = 0x02,
    CrcError = 0x03,
    DataRangeError = 0x04,
    DataLengthError = 0x05,
    DataLimitError = 0x06,
    AccessError = 0x07,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidSoftwareError {
    pub byte_without_msb: u8,
}

impl SoftwareError {
    #[inline]
    pub const fn check(byte: u8) -> Result<Option<Self>, InvalidSoftwareError> {
        match byte & !ALERT {
            0x00 => Ok(None),
            0x01 => Ok(Some(Self::ResultFail)),
            0x02 => Ok(Some(Self::InstructionError)),
            0x03 => Ok(Some(Self::CrcError)),
            0x04 => Ok(Some(Self::DataRangeError)),
            0x05 => Ok(Some(Self::DataLengthError)),
            0x06 => Ok(Some(Self::DataLimitError)),
            0x07 => Ok(Some(Self::AccessError)),
            byte_without_msb => Err(InvalidSoftwareError { byte_without_msb }),
        }
    }
}

impl fmt::Display for SoftwareError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::ResultFail => "result fail",
            Self::InstructionError => "instruction error",
            Self::CrcError => "crc error",
            Self::DataRangeError => "data range error",
            Self::DataLengthError => "data length error",
            Self::DataLimitError => "data limit error",
            Self::AccessError => "access error",
        })
    }
}

impl fmt::Display for InvalidSoftwareError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown error: 0x{:02X}", self.byte_without_msb)
    }
}

/// Error byte of a protocol 2.0 status packet: one software error code plus the alert bit.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct StatusError(u8);

impl StatusError {
    #[inline(always)]
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn alert(self) -> bool {
        self.0 & ALERT != 0
    }

    #[inline(always)]
    pub const fn software(self) -> Result<Option<SoftwareError>, InvalidSoftwareError> {
        SoftwareError::check(self.0)
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.software() {
            Ok(None) if self.alert() => return f.write_str("hardware alert"),
            Ok(None) => return f.write_str("no error"),
            Ok(Some(e)) => fmt::Display::fmt(&e, f)?,
            Err(e) => fmt::Display::fmt(&e, f)?,
        }
        if self.alert() {
            f.write_str(" (hardware alert)")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    Header(u8),
    Id,
    LengthLow,
    LengthHigh,
    Instruction,
    Error,
    Parameters,
    CrcLow,
    CrcHigh,
}

/// Status packet parser. Reads the nine fixed bytes through the error byte, every
/// parameter, then the CRC. The reserved header byte is not checked.
#[derive(Debug)]
pub struct Parser {
    stage: Stage,
    id: u8,
    length: u16,
    error: u8,
    remaining: usize,
    parameters: Vec<u8>,
    crc: Crc,
    crc_low: u8,
}

impl Parser {
    #[inline]
    pub const fn new() -> Self {
        Self {
            stage: Stage::Header(0),
            id: 0,
            length: 0,
            error: 0,
            remaining: 0,
            parameters: Vec::new(),
            crc: Crc::new(),
            crc_low: 0,
        }
    }
}

impl Default for Parser {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl State for Parser {
    type Output = StatusPacket<StatusError>;
    type Error = FrameError;

    #[inline]
    fn wants(&self) -> usize {
        match self.stage {
            Stage::Header(seen) => 9 - usize::from(seen),
            Stage::Id => 5,
            Stage::LengthLow => 4,
            Stage::LengthHigh => 3,
            Stage::Instruction | Stage::CrcLow => 2,
            Stage::Error | Stage::CrcHigh => 1,
            Stage::Parameters => self.remaining,
        }
    }

    fn push(mut self, input: u8) -> Result<Status<Self::Output, Self>, Self::Error> {
        if !matches!(self.stage, Stage::CrcLow | Stage::CrcHigh) {
            self.crc.push(input);
        }
        match self.stage {
            Stage::Header(index) => {
                if let Some(&expected) = constants::V2_HEADER[..3].get(usize::from(index)) {
                    if input != expected {
                        return Err(FrameError::Header {
                            index,
                            expected,
                            actual: input,
                        });
                    }
                }
                self.stage = if index == 3 {
                    Stage::Id
                } else {
                    Stage::Header(index + 1)
                };
            }
            Stage::Id => {
                self.id = input;
                self.stage = Stage::LengthLow;
            }
            Stage::LengthLow => {
                self.length = input.into();
                self.stage = Stage::LengthHigh;
            }
            Stage::LengthHigh => {
                self.length |= u16::from(input) << 8;
                self.stage = Stage::Instruction;
            }
            Stage::Instruction => {
                if input != constants::STATUS {
                    return Err(FrameError::Instruction { actual: input });
                }
                self.stage = Stage::Error;
            }
            Stage::Error => {
                let Some(count) = self.length.checked_sub(4) else {
                    return Err(FrameError::Length {
                        length: self.length,
                    });
                };
                self.error = input;
                self.remaining = count.into();
                self.parameters.reserve_exact(self.remaining);
                self.stage = if self.remaining == 0 {
                    Stage::CrcLow
                } else {
                    Stage::Parameters
                };
            }
            Stage::Parameters => {
                self.parameters.push(input);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.stage = Stage::CrcLow;
                }
            }
            Stage::CrcLow => {
                self.crc_low = input;
                self.stage = Stage::CrcHigh;
            }
            Stage::CrcHigh => {
                return Ok(Status::Complete(StatusPacket {
                    id: self.id,
                    error: (self.error != 0).then_some(StatusError(self.error)),
                    parameters: self.parameters,
                    checksum: u16::from_le_bytes([self.crc_low, input]),
                    expected_checksum: self.crc.collapse(),
                }));
            }
        }
        Ok(Status::Incomplete(self))
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::parse,
        quickcheck::{Arbitrary, Gen, TestResult},
        quickcheck_macros::quickcheck,
        strum::VariantArray,
    };

    impl Arbitrary for SoftwareError {
        #[inline]
        fn arbitrary(g: &mut Gen) -> Self {
            let i = usize::arbitrary(g) % const { Self::VARIANTS.len() };
            Self::VARIANTS[i]
        }

        #[inline]
        fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
            let i = Self::VARIANTS
                .binary_search(self)
                .expect("Invalid enum variant");
            Box::new(i.shrink().filter_map(|j| Self::VARIANTS.get(j).copied()))
        }
    }

    fn parse_in_chunks(bytes: &[u8]) -> (Result<StatusPacket<StatusError>, FrameError>, Vec<usize>) {
        let mut state = Parser::new();
        let mut chunks = vec![];
        let mut offset = 0;
        loop {
            let wants = state.wants();
            chunks.push(wants);
            let Some(chunk) = bytes.get(offset..offset + wants) else {
                panic!("Parser wants {wants} bytes after {offset} but only {} remain", bytes.len() - offset);
            };
            offset += wants;
            state = match parse::feed(state, chunk) {
                Err(e) => return (Err(e), chunks),
                Ok(Status::Complete(packet)) => {
                    assert_eq!(offset, bytes.len(), "Parser finished early");
                    return (Ok(packet), chunks);
                }
                Ok(Status::Incomplete(updated)) => updated,
            };
        }
    }

    #[quickcheck]
    fn byte_software_error_roundtrip(byte: u8) -> TestResult {
        let Ok(Some(software_error)) = SoftwareError::check(byte) else {
            return TestResult::discard();
        };
        let roundtrip = software_error as u8;
        let byte_without_msb = byte & !ALERT;
        if roundtrip == byte_without_msb {
            TestResult::passed()
        } else {
            TestResult::error(format!("Invalid software-error byte logic: {byte:#?} -> {software_error:#?} -> {roundtrip:#?} =/= {byte_without_msb:#?}"))
        }
    }

    #[quickcheck]
    fn software_error_byte_roundtrip(software_error: SoftwareError) -> TestResult {
        let byte_without_msb = software_error as u8;
        let result = SoftwareError::check(byte_without_msb);
        if result == Ok(Some(software_error)) {
            TestResult::passed()
        } else {
            TestResult::error(format!("Invalid software-error byte logic: {software_error:#?} -> {byte_without_msb:#?} -> {result:#?} =/= Ok(Some({software_error:#?}))"))
        }
    }

    #[test]
    fn decode_error() {
        assert_eq!(StatusError::new(0x00).to_string(), "no error");
        assert_eq!(StatusError::new(0x01).to_string(), "result fail");
        assert_eq!(StatusError::new(0x07).to_string(), "access error");
        assert_eq!(StatusError::new(0x08).to_string(), "unknown error: 0x08");
        assert_eq!(StatusError::new(0x80).to_string(), "hardware alert");
        assert_eq!(
            StatusError::new(0x84).to_string(),
            "data range error (hardware alert)"
        );
    }

    #[test]
    fn parse_ping() {
        let (packet, chunks) = parse_in_chunks(&[
            0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x07, 0x00, 0x55, 0x00, 0x06, 0x04, 0x26, 0x65, 0x5D,
        ]);
        let packet = packet.unwrap();
        assert_eq!(chunks, [9, 3, 2]);
        assert_eq!(packet.id, 0x01);
        assert_eq!(packet.error, None);
        assert_eq!(packet.parameters, [0x06, 0x04, 0x26]);
        assert_eq!(packet.checksum, 0x5D65);
        assert!(packet.checksum_matches());
    }

    #[test]
    fn parse_empty_reply() {
        let (packet, chunks) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x04, 0x00, 0x55, 0x00, 0xA1, 0x0C]);
        assert_eq!(chunks, [9, 2]);
        let packet = packet.unwrap();
        assert!(packet.parameters.is_empty());
        assert!(packet.checksum_matches());
    }

    #[test]
    fn parse_error_reply() {
        let (packet, _) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x04, 0x00, 0x55, 0x01, 0xA4, 0x8C]);
        let packet = packet.unwrap();
        assert_eq!(packet.error, Some(StatusError::new(0x01)));
        assert!(packet.checksum_matches());
    }

    #[test]
    fn parse_wrong_header() {
        let (packet, chunks) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFE, 0x00, 0x01, 0x04, 0x00, 0x55, 0x00]);
        assert_eq!(chunks, [9]);
        assert_eq!(
            packet,
            Err(FrameError::Header {
                index: 2,
                expected: 0xFD,
                actual: 0xFE
            })
        );
    }

    #[test]
    fn parse_reserved_byte_is_ignored() {
        let (packet, _) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFD, 0x01, 0x01, 0x04, 0x00, 0x55, 0x00, 0x00, 0x00]);
        let packet = packet.unwrap();
        assert_eq!(packet.id, 0x01);
        assert!(!packet.checksum_matches());
    }

    #[test]
    fn parse_wrong_instruction() {
        let (packet, _) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x04, 0x00, 0x03, 0x00]);
        assert_eq!(packet, Err(FrameError::Instruction { actual: 0x03 }));
    }

    #[test]
    fn parse_short_length() {
        let (packet, _) =
            parse_in_chunks(&[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x55, 0x00]);
        assert_eq!(packet, Err(FrameError::Length { length: 3 }));
    }
}
