//! Per-model control tables: which registers exist, where, and what may be written.

use {crate::Generation, core::fmt};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Width {
    Byte = 1,
    Word = 2,
}

impl Width {
    #[inline(always)]
    pub const fn bytes(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Register {
    pub address: u8,
    pub width: Width,
    pub access: Access,
    /// Reads are served from the host-side copy of the control table.
    pub cacheable: bool,
    pub min: u16,
    pub max: u16,
}

impl Register {
    const fn read_write(address: u8, width: Width, min: u16, max: u16) -> Self {
        Self {
            address,
            width,
            access: Access::ReadWrite,
            cacheable: true,
            min,
            max,
        }
    }

    /// Read-only and changes under the device's own control.
    const fn present(address: u8, width: Width) -> Self {
        Self {
            address,
            width,
            access: Access::ReadOnly,
            cacheable: false,
            min: 0,
            max: 0,
        }
    }

    /// Read-only and fixed for the lifetime of the device.
    const fn fixed(address: u8, width: Width) -> Self {
        Self {
            address,
            width,
            access: Access::ReadOnly,
            cacheable: true,
            min: 0,
            max: 0,
        }
    }

    #[inline(always)]
    pub const fn range(&self) -> core::ops::Range<usize> {
        self.address as usize..self.address as usize + self.width.bytes()
    }

    /// Little-endian value of exactly `self.width` bytes.
    #[inline]
    pub fn decode(&self, bytes: &[u8]) -> u16 {
        match *bytes {
            [lo, hi, ..] if self.width == Width::Word => u16::from_le_bytes([lo, hi]),
            [lo, ..] => lo.into(),
            [] => 0,
        }
    }
}

macro_rules! register_names {
    ($($name:ident => $description:literal,)*) => {
        #[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        #[cfg_attr(test, derive(strum_macros::VariantArray))]
        pub enum RegName {
            $($name,)*
        }

        impl RegName {
            #[inline]
            pub const fn description(self) -> &'static str {
                match self {
                    $(Self::$name => $description,)*
                }
            }
        }
    };
}

register_names! {
    ModelNumber => "Model Number",
    FirmwareVersion => "Firmware Version",
    ServoId => "ID",
    BaudRate => "Baud Rate",
    ReturnDelayTime => "Return Delay Time",
    CwAngleLimit => "CW Angle Limit",
    CcwAngleLimit => "CCW Angle Limit",
    ControlMode => "Control Mode",
    HighestLimitTemperature => "Highest Limit Temperature",
    LowestLimitVoltage => "Lowest Limit Voltage",
    HighestLimitVoltage => "Highest Limit Voltage",
    MaxTorque => "Max Torque",
    StatusReturnLevel => "Status Return Level",
    AlarmLed => "Alarm LED",
    AlarmShutdown => "Alarm Shutdown",
    TorqueEnable => "Torque Enable",
    Led => "LED",
    CwComplianceMargin => "CW Compliance Margin",
    CcwComplianceMargin => "CCW Compliance Margin",
    CwComplianceSlope => "CW Compliance Slope",
    CcwComplianceSlope => "CCW Compliance Slope",
    DGain => "D Gain",
    IGain => "I Gain",
    PGain => "P Gain",
    GoalPosition => "Goal Position",
    MovingSpeed => "Moving Speed",
    GoalVelocity => "Goal Velocity",
    GoalTorque => "Goal Torque",
    TorqueLimit => "Torque Limit",
    PresentPosition => "Present Position",
    PresentSpeed => "Present Speed",
    PresentLoad => "Present Load",
    PresentVoltage => "Present Voltage",
    PresentTemperature => "Present Temperature",
    RegisteredInstruction => "Registered Instruction",
    Moving => "Moving",
    HardwareErrorStatus => "Hardware Error Status",
    Lock => "Lock",
    Punch => "Punch",
}

impl fmt::Display for RegName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Immutable register map of one model.
#[derive(Debug)]
pub struct Catalog {
    pub model: &'static str,
    pub generation: Generation,
    pub table_size: u16,
    registers: &'static [(RegName, Register)],
}

impl Catalog {
    #[inline]
    pub fn get(&self, name: RegName) -> Option<Register> {
        self.registers
            .iter()
            .find(|&&(n, _)| n == name)
            .map(|&(_, register)| register)
    }

    #[inline]
    pub fn registers(&self) -> impl Iterator<Item = (RegName, Register)> + '_ {
        self.registers.iter().copied()
    }
}

use {Width::*, Register as R, RegName as N};

pub static AX_12: Catalog = Catalog {
    model: "AX-12",
    generation: Generation::V1,
    table_size: 50,
    registers: &[
        // EEPROM
        (N::ModelNumber, R::fixed(0x00, Word)),
        (N::FirmwareVersion, R::fixed(0x02, Byte)),
        (N::ServoId, R::read_write(0x03, Byte, 0, 252)),
        (N::BaudRate, R::read_write(0x04, Byte, 0, 254)),
        (N::ReturnDelayTime, R::read_write(0x05, Byte, 0, 254)),
        (N::CwAngleLimit, R::read_write(0x06, Word, 0, 1023)),
        (N::CcwAngleLimit, R::read_write(0x08, Word, 0, 1023)),
        (N::HighestLimitTemperature, R::read_write(0x0B, Byte, 0, 70)),
        (N::LowestLimitVoltage, R::read_write(0x0C, Byte, 50, 250)),
        (N::HighestLimitVoltage, R::read_write(0x0D, Byte, 50, 250)),
        (N::MaxTorque, R::read_write(0x0E, Word, 0, 1023)),
        (N::StatusReturnLevel, R::read_write(0x10, Byte, 0, 2)),
        (N::AlarmLed, R::read_write(0x11, Byte, 0, 255)),
        (N::AlarmShutdown, R::read_write(0x12, Byte, 0, 255)),
        // RAM
        (N::TorqueEnable, R::read_write(0x18, Byte, 0, 1)),
        (N::Led, R::read_write(0x19, Byte, 0, 1)),
        (N::CwComplianceMargin, R::read_write(0x1A, Byte, 0, 255)),
        (N::CcwComplianceMargin, R::read_write(0x1B, Byte, 0, 255)),
        (N::CwComplianceSlope, R::read_write(0x1C, Byte, 0, 254)),
        (N::CcwComplianceSlope, R::read_write(0x1D, Byte, 0, 254)),
        (N::GoalPosition, R::read_write(0x1E, Word, 0, 1023)),
        (N::MovingSpeed, R::read_write(0x20, Word, 0, 1023)),
        (N::TorqueLimit, R::read_write(0x22, Word, 0, 1023)),
        (N::PresentPosition, R::present(0x24, Word)),
        (N::PresentSpeed, R::present(0x26, Word)),
        (N::PresentLoad, R::present(0x28, Word)),
        (N::PresentVoltage, R::present(0x2A, Byte)),
        (N::PresentTemperature, R::present(0x2B, Byte)),
        (N::RegisteredInstruction, R::present(0x2C, Byte)),
        (N::Moving, R::present(0x2E, Byte)),
        (N::Lock, R::read_write(0x2F, Byte, 0, 1)),
        (N::Punch, R::read_write(0x30, Word, 32, 1023)),
    ],
};

pub static XL_320: Catalog = Catalog {
    model: "XL-320",
    generation: Generation::V2,
    table_size: 53,
    registers: &[
        // EEPROM
        (N::ModelNumber, R::fixed(0x00, Word)),
        (N::FirmwareVersion, R::fixed(0x02, Byte)),
        (N::ServoId, R::read_write(0x03, Byte, 0, 252)),
        (N::BaudRate, R::read_write(0x04, Byte, 0, 3)),
        (N::ReturnDelayTime, R::read_write(0x05, Byte, 0, 254)),
        (N::CwAngleLimit, R::read_write(0x06, Word, 0, 1023)),
        (N::CcwAngleLimit, R::read_write(0x08, Word, 0, 1023)),
        (N::ControlMode, R::read_write(0x0B, Byte, 1, 2)),
        (N::HighestLimitTemperature, R::read_write(0x0C, Byte, 0, 150)),
        (N::LowestLimitVoltage, R::read_write(0x0D, Byte, 50, 250)),
        (N::HighestLimitVoltage, R::read_write(0x0E, Byte, 50, 250)),
        (N::MaxTorque, R::read_write(0x0F, Word, 0, 1023)),
        (N::StatusReturnLevel, R::read_write(0x11, Byte, 0, 2)),
        (N::AlarmShutdown, R::read_write(0x12, Byte, 0, 255)),
        // RAM
        (N::TorqueEnable, R::read_write(0x18, Byte, 0, 1)),
        (N::Led, R::read_write(0x19, Byte, 0, 7)),
        (N::DGain, R::read_write(0x1B, Byte, 0, 254)),
        (N::IGain, R::read_write(0x1C, Byte, 0, 254)),
        (N::PGain, R::read_write(0x1D, Byte, 0, 254)),
        (N::GoalPosition, R::read_write(0x1E, Word, 0, 1023)),
        (N::GoalVelocity, R::read_write(0x20, Word, 0, 2047)),
        (N::GoalTorque, R::read_write(0x23, Word, 0, 1023)),
        (N::PresentPosition, R::present(0x25, Word)),
        (N::PresentSpeed, R::present(0x27, Word)),
        (N::PresentLoad, R::present(0x29, Word)),
        (N::PresentVoltage, R::present(0x2D, Byte)),
        (N::PresentTemperature, R::present(0x2E, Byte)),
        (N::RegisteredInstruction, R::present(0x2F, Byte)),
        (N::Moving, R::present(0x31, Byte)),
        (N::HardwareErrorStatus, R::present(0x32, Byte)),
        (N::Punch, R::read_write(0x33, Word, 32, 1023)),
    ],
};
