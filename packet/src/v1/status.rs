use {
    crate::{
        FrameError, StatusPacket,
        checksum::Checksum,
        constants,
        parse::{State, Status},
    },
    alloc::vec::Vec,
    core::fmt,
};

/// One bit of a protocol 1.0 error byte.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(test, derive(strum_macros::VariantArray))]
pub enum Alarm {
    InputVoltage = 0x01,
    AngleLimit = 0x02,
    Overheating = 0x04,
    Range = 0x08,
    Checksum = 0x10,
    Overload = 0x20,
    Instruction = 0x40,
    Unknown = 0x80,
}

impl Alarm {
    /// In bit order.
    pub const ALL: [Self; 8] = [
        Self::InputVoltage,
        Self::AngleLimit,
        Self::Overheating,
        Self::Range,
        Self::Checksum,
        Self::Overload,
        Self::Instruction,
        Self::Unknown,
    ];

    #[inline]
    pub const fn description(self) -> &'static str {
        match self {
            Self::InputVoltage => "input voltage",
            Self::AngleLimit => "angle limit",
            Self::Overheating => "overheating",
            Self::Range => "range",
            Self::Checksum => "checksum",
            Self::Overload => "overload",
            Self::Instruction => "instruction",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Alarm {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Error byte of a protocol 1.0 status packet: any combination of alarms.
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
    pub const fn contains(self, alarm: Alarm) -> bool {
        self.0 & alarm as u8 != 0
    }

    #[inline]
    pub fn alarms(self) -> impl Iterator<Item = Alarm> {
        Alarm::ALL
            .into_iter()
            .filter(move |&alarm| self.contains(alarm))
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut alarms = self.alarms();
        let Some(first) = alarms.next() else {
            return f.write_str("no error");
        };
        let plural = if self.0.count_ones() > 1 { "s" } else { "" };
        write!(f, "status error{plural}: {first}")?;
        for alarm in alarms {
            write!(f, ", {alarm}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Stage {
    Header(u8),
    Id,
    /// A second `0xFF` arrived where the ID belongs.
    IdAfterSpuriousHeader,
    Length,
    Error,
    Parameters,
    Checksum,
}

/// Status packet parser. Reads `FF FF id`, one more byte if that ID was a stray `0xFF`,
/// then `length error`, every parameter, and the checksum, in that order.
#[derive(Debug)]
pub struct Parser {
    stage: Stage,
    id: u8,
    error: u8,
    remaining: usize,
    parameters: Vec<u8>,
    checksum: Checksum,
}

impl Parser {
    #[inline]
    pub const fn new() -> Self {
        Self {
            stage: Stage::Header(0),
            id: 0,
            error: 0,
            remaining: 0,
            parameters: Vec::new(),
            checksum: Checksum::new(),
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
            Stage::Header(seen) => 3 - usize::from(seen),
            Stage::Id | Stage::IdAfterSpuriousHeader | Stage::Error | Stage::Checksum => 1,
            Stage::Length => 2,
            Stage::Parameters => self.remaining,
        }
    }

    fn push(mut self, input: u8) -> Result<Status<Self::Output, Self>, Self::Error> {
        match self.stage {
            Stage::Header(seen) => {
                if input != constants::HEADER {
                    return Err(FrameError::Header {
                        index: seen,
                        expected: constants::HEADER,
                        actual: input,
                    });
                }
                self.stage = if seen == 0 {
                    Stage::Header(1)
                } else {
                    Stage::Id
                };
            }
            Stage::Id if input == constants::HEADER => {
                log::warn!("Skipping a spurious 0xFF before the ID of a status packet");
                self.stage = Stage::IdAfterSpuriousHeader;
            }
            Stage::Id | Stage::IdAfterSpuriousHeader => {
                self.id = input;
                self.checksum.push(input);
                self.stage = Stage::Length;
            }
            Stage::Length => {
                let Some(count) = input.checked_sub(2) else {
                    return Err(FrameError::Length {
                        length: input.into(),
                    });
                };
                self.remaining = count.into();
                self.parameters.reserve_exact(self.remaining);
                self.checksum.push(input);
                self.stage = Stage::Error;
            }
            Stage::Error => {
                self.error = input;
                self.checksum.push(input);
                self.stage = if self.remaining == 0 {
                    Stage::Checksum
                } else {
                    Stage::Parameters
                };
            }
            Stage::Parameters => {
                self.parameters.push(input);
                self.checksum.push(input);
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.stage = Stage::Checksum;
                }
            }
            Stage::Checksum => {
                return Ok(Status::Complete(StatusPacket {
                    id: self.id,
                    error: (self.error != 0).then_some(StatusError(self.error)),
                    parameters: self.parameters,
                    checksum: input.into(),
                    expected_checksum: self.checksum.collapse().into(),
                }));
            }
        }
        Ok(Status::Incomplete(self))
    }
}
