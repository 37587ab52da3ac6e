pub mod actuator;
pub mod bus;
pub mod comm;
pub mod config;
pub mod mutex;
pub mod protocol;
pub mod sync;

#[cfg(test)]
mod test_util;

use {
    dynamixel_packet::{EncodeError, FrameError, Id, control_table::RegName, id::InvalidId, v1, v2},
    std::{fmt, io, time::Duration},
};

pub use {
    actuator::{Actuator, ReturnLevel},
    config::Config,
    dynamixel_packet as packet,
    protocol::{Codec, Outcome, Protocol, ProtocolV1, ProtocolV2, Receipt, open},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error from the serial transport: {0}")]
    Transport(#[from] io::Error),
    #[error("Timed out after {timeout:?} with {received} of {expected} bytes")]
    ReadTimeout {
        expected: usize,
        received: usize,
        timeout: Duration,
    },
    #[error("Malformed status packet: {0}")]
    Framing(#[from] FrameError),
    #[error(
        "Status packet checksum mismatch: computed 0x{expected:04X} but received 0x{actual:04X}"
    )]
    Checksum { expected: u16, actual: u16 },
    #[error("Dynamixel ID {id} reported {error}")]
    Device { id: u8, error: DeviceError },
    #[error("Expected a status packet from Dynamixel ID {expected} but received one from ID {actual}")]
    IdentMismatch { expected: Id, actual: u8 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Busy(#[from] mutex::Busy),
}

impl From<EncodeError> for Error {
    #[inline(always)]
    fn from(e: EncodeError) -> Self {
        Self::Validation(e.into())
    }
}

/// Error byte of a status packet, decoded per protocol generation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeviceError {
    V1(v1::StatusError),
    V2(v2::StatusError),
}

impl fmt::Display for DeviceError {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::V1(ref e) => fmt::Display::fmt(e, f),
            Self::V2(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl From<v1::StatusError> for DeviceError {
    #[inline(always)]
    fn from(e: v1::StatusError) -> Self {
        Self::V1(e)
    }
}

impl From<v2::StatusError> for DeviceError {
    #[inline(always)]
    fn from(e: v2::StatusError) -> Self {
        Self::V2(e)
    }
}

/// Rejected before anything touches the bus.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{model} has no {register} register")]
    Unsupported {
        model: &'static str,
        register: RegName,
    },
    #[error("{0} is read-only")]
    ReadOnly(RegName),
    #[error("{value} is out of range for {register} ({min}..={max})")]
    OutOfRange {
        register: RegName,
        value: i32,
        min: u16,
        max: u16,
    },
    #[error("Status return level must be between 0 and 2, not {0}")]
    ReturnLevel(i32),
    #[error("The broadcast ID never answers, so it cannot be pinged or read")]
    Broadcast,
    #[error(transparent)]
    Id(#[from] InvalidId),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Refused because of what is already known about the device.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum StateError {
    #[error("Dynamixel ID {0} has status return level 0 and never answers reads")]
    ReturnLevelZero(Id),
    #[error("Dynamixel ID {0} is locked until its power is cycled")]
    Locked(Id),
    #[error("Dynamixel ID {id} reported an invalid status return level: {level}")]
    InvalidReturnLevel { id: Id, level: u16 },
}
