use {
    crate::{
        Error, StateError, ValidationError,
        mutex::Mutex,
        protocol::{Outcome, Protocol, Receipt},
    },
    dynamixel_packet::{
        Id,
        control_table::{Access, Catalog, RegName, Register},
    },
    paste::paste,
    std::mem,
};

/// Which instructions a device answers with a status packet.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum ReturnLevel {
    PingOnly = 0,
    Read = 1,
    All = 2,
}

impl ReturnLevel {
    #[inline]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::PingOnly),
            1 => Some(Self::Read),
            2 => Some(Self::All),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn answers_reads(self) -> bool {
        !matches!(self, Self::PingOnly)
    }

    #[inline(always)]
    pub const fn answers_writes(self) -> bool {
        matches!(self, Self::All)
    }
}

impl TryFrom<i32> for ReturnLevel {
    type Error = ValidationError;

    #[inline]
    fn try_from(value: i32) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_byte)
            .ok_or(ValidationError::ReturnLevel(value))
    }
}

macro_rules! control_table_methods {
    ($name:ident) => {
        paste! {
            #[inline]
            pub fn [< $name:snake >](&mut self) -> Result<u16, Error> {
                self.get(RegName::$name)
            }

            #[inline]
            pub fn [< set_ $name:snake >](&mut self, value: i32) -> Result<(), Error> {
                self.set(RegName::$name, value)
            }
        }
    };
}

macro_rules! read_only_methods {
    ($name:ident) => {
        paste! {
            #[inline]
            pub fn [< $name:snake >](&mut self) -> Result<u16, Error> {
                self.get(RegName::$name)
            }
        }
    };
}

/// A buffered write that reaches the cache only once its receipt is committed.
#[derive(Debug)]
struct Pending {
    receipt: Receipt,
    name: RegName,
    register: Register,
    data: Vec<u8>,
}

/// One device on a shared bus, with a host-side copy of its control table.
///
/// Registers marked cacheable are answered from that copy; everything else is read from the
/// device, and whatever comes back refreshes the copy too. Buffered writes change the copy
/// only after ACTION has carried them to the device.
pub struct Actuator<'bus, M: Mutex<Item: Protocol>> {
    bus: &'bus M,
    catalog: &'bus Catalog,
    id: Id,
    return_level: Option<ReturnLevel>,
    cache: Vec<u8>,
    pending: Vec<Pending>,
}

impl<'bus, M: Mutex<Item: Protocol>> Actuator<'bus, M> {
    /// No I/O: the return level is unknown and the cache is zeroed until [`Self::resync`].
    #[inline]
    pub fn new(bus: &'bus M, catalog: &'bus Catalog, id: Id) -> Result<Self, ValidationError> {
        if id.is_broadcast() {
            return Err(ValidationError::Broadcast);
        }
        Ok(Self {
            bus,
            catalog,
            id,
            return_level: None,
            cache: vec![0; catalog.table_size.into()],
            pending: vec![],
        })
    }

    #[inline]
    pub fn with_return_level(
        bus: &'bus M,
        catalog: &'bus Catalog,
        id: Id,
        return_level: ReturnLevel,
    ) -> Result<Self, ValidationError> {
        let mut actuator = Self::new(bus, catalog, id)?;
        actuator.remember_return_level(return_level);
        Ok(actuator)
    }

    /// Make sure the device is there, learn its return level, and fill the cache if it will
    /// answer reads.
    pub fn connect(bus: &'bus M, catalog: &'bus Catalog, id: Id) -> Result<Self, Error> {
        let mut actuator = Self::new(bus, catalog, id)?;
        actuator.ping()?;
        if actuator.fetch_return_level()?.answers_reads() {
            actuator.resync()?;
        }
        Ok(actuator)
    }

    #[inline]
    pub fn id(&mut self) -> Id {
        self.settle();
        self.id
    }

    #[inline(always)]
    pub const fn catalog(&self) -> &'bus Catalog {
        self.catalog
    }

    #[inline]
    pub fn cached_return_level(&mut self) -> Option<ReturnLevel> {
        self.settle();
        self.return_level
    }

    #[inline]
    pub fn cache(&mut self) -> &[u8] {
        self.settle();
        &self.cache
    }

    /// Replace the whole cache with one read of the entire control table.
    pub fn resync(&mut self) -> Result<(), Error> {
        self.settle();
        self.readable()?;
        log::debug!("Reading the whole control table of Dynamixel ID {}", self.id);
        let table = self.bus.lock()?.read(self.id, 0, self.catalog.table_size)?;
        self.cache.copy_from_slice(&table);
        if let Ok(register) = self.register(RegName::StatusReturnLevel) {
            let byte = self.cache[usize::from(register.address)];
            self.return_level = ReturnLevel::from_byte(byte).or(self.return_level);
        }
        Ok(())
    }

    pub fn get(&mut self, name: RegName) -> Result<u16, Error> {
        self.settle();
        let register = self.register(name)?;
        if register.cacheable {
            return Ok(register.decode(&self.cache[register.range()]));
        }
        self.readable()?;
        let bytes = self
            .bus
            .lock()?
            .read(self.id, register.address.into(), register.width as u16)?;
        self.cache[register.range()].copy_from_slice(&bytes);
        Ok(register.decode(&bytes))
    }

    pub fn set(&mut self, name: RegName, value: i32) -> Result<(), Error> {
        self.settle();
        let register = self.register(name)?;
        if name == RegName::StatusReturnLevel {
            return self.set_return_level(value);
        }
        // Clearing the lock takes a power cycle.
        if name == RegName::Lock
            && value == 0
            && register.decode(&self.cache[register.range()]) != 0
        {
            return Err(StateError::Locked(self.id).into());
        }
        let value = validate(name, register, value)?;
        let expect_response = self.return_level()?.answers_writes();
        let bytes = value.to_le_bytes();
        let data = &bytes[..register.width.bytes()];
        let receipt = self
            .bus
            .lock()?
            .write(self.id, register.address.into(), data, expect_response)?;
        self.written(name, register, data, receipt);
        Ok(())
    }

    /// Whether to wait for a reply depends on the level being set, not the one it replaces.
    pub fn set_return_level(&mut self, value: i32) -> Result<(), Error> {
        self.settle();
        let level = ReturnLevel::try_from(value)?;
        let register = self.register(RegName::StatusReturnLevel)?;
        let receipt = self.bus.lock()?.write(
            self.id,
            register.address.into(),
            &[level as u8],
            level.answers_writes(),
        )?;
        self.written(RegName::StatusReturnLevel, register, &[level as u8], receipt);
        Ok(())
    }

    /// Read the return level from the device. A device at level 0 never answers that read,
    /// so silence is followed by a PING to tell it apart from a device that is not there.
    pub fn fetch_return_level(&mut self) -> Result<ReturnLevel, Error> {
        self.settle();
        let register = self.register(RegName::StatusReturnLevel)?;
        let read = self.bus.lock()?.read(self.id, register.address.into(), 1);
        let level = match read {
            Ok(bytes) => {
                let byte = bytes[0];
                ReturnLevel::from_byte(byte).ok_or(StateError::InvalidReturnLevel {
                    id: self.id,
                    level: byte.into(),
                })?
            }
            Err(Error::ReadTimeout { .. }) => {
                log::debug!(
                    "Dynamixel ID {} did not answer a read; pinging to rule out return level 0",
                    self.id
                );
                self.ping()?;
                ReturnLevel::PingOnly
            }
            Err(e) => return Err(e),
        };
        self.remember_return_level(level);
        Ok(level)
    }

    #[inline]
    pub fn return_level(&mut self) -> Result<ReturnLevel, Error> {
        self.settle();
        match self.return_level {
            Some(level) => Ok(level),
            None => self.fetch_return_level(),
        }
    }

    #[inline]
    pub fn ping(&mut self) -> Result<(), Error> {
        self.settle();
        self.bus.lock()?.ping(self.id)
    }

    /// Commits every staged write on the bus, not only this device's. Other actuators see
    /// their own writes land the next time they are used.
    #[inline]
    pub fn action(&mut self) -> Result<(), Error> {
        let result = self.bus.lock()?.action();
        self.settle();
        result
    }

    /// Applies to the whole bus.
    #[inline]
    pub fn set_buffered(&self, buffered: bool) -> Result<(), Error> {
        self.bus.lock()?.set_buffered(buffered);
        Ok(())
    }

    #[inline]
    fn register(&self, name: RegName) -> Result<Register, ValidationError> {
        self.catalog.get(name).ok_or(ValidationError::Unsupported {
            model: self.catalog.model,
            register: name,
        })
    }

    fn readable(&mut self) -> Result<(), Error> {
        if self.return_level()?.answers_reads() {
            Ok(())
        } else {
            Err(StateError::ReturnLevelZero(self.id).into())
        }
    }

    /// A write went through or was staged; the cache follows once the device has it.
    fn written(
        &mut self,
        name: RegName,
        register: Register,
        data: &[u8],
        receipt: Option<Receipt>,
    ) {
        match receipt {
            None => self.apply(name, register, data),
            Some(receipt) => self.pending.push(Pending {
                receipt,
                name,
                register,
                data: data.to_vec(),
            }),
        }
    }

    /// Fold in staged writes whose fate is known, oldest first.
    fn settle(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        for pending in mem::take(&mut self.pending) {
            match pending.receipt.outcome() {
                Outcome::Pending => self.pending.push(pending),
                Outcome::Committed => self.apply(pending.name, pending.register, &pending.data),
                Outcome::Dropped => log::debug!(
                    "Dynamixel ID {} never received {:02X?} for {}",
                    self.id,
                    pending.data,
                    pending.name
                ),
            }
        }
    }

    fn apply(&mut self, name: RegName, register: Register, data: &[u8]) {
        self.cache[register.range()].copy_from_slice(data);
        match name {
            RegName::ServoId => {
                if let Ok(id) = Id::new(data[0]) {
                    log::debug!("Dynamixel ID {} is now ID {id}", self.id);
                    self.id = id;
                }
            }
            RegName::StatusReturnLevel => {
                self.return_level = ReturnLevel::from_byte(data[0]).or(self.return_level);
            }
            _ => {}
        }
    }

    fn remember_return_level(&mut self, level: ReturnLevel) {
        if let Ok(register) = self.register(RegName::StatusReturnLevel) {
            self.cache[usize::from(register.address)] = level as u8;
        }
        self.return_level = Some(level);
    }

    read_only_methods!(ModelNumber);
    read_only_methods!(FirmwareVersion);
    control_table_methods!(ServoId);
    control_table_methods!(BaudRate);
    control_table_methods!(ReturnDelayTime);
    control_table_methods!(CwAngleLimit);
    control_table_methods!(CcwAngleLimit);
    control_table_methods!(ControlMode);
    control_table_methods!(HighestLimitTemperature);
    control_table_methods!(LowestLimitVoltage);
    control_table_methods!(HighestLimitVoltage);
    control_table_methods!(MaxTorque);
    control_table_methods!(StatusReturnLevel);
    control_table_methods!(AlarmLed);
    control_table_methods!(AlarmShutdown);
    control_table_methods!(TorqueEnable);
    control_table_methods!(Led);
    control_table_methods!(CwComplianceMargin);
    control_table_methods!(CcwComplianceMargin);
    control_table_methods!(CwComplianceSlope);
    control_table_methods!(CcwComplianceSlope);
    control_table_methods!(DGain);
    control_table_methods!(IGain);
    control_table_methods!(PGain);
    control_table_methods!(GoalPosition);
    control_table_methods!(MovingSpeed);
    control_table_methods!(GoalVelocity);
    control_table_methods!(GoalTorque);
    control_table_methods!(TorqueLimit);
    read_only_methods!(PresentPosition);
    read_only_methods!(PresentSpeed);
    read_only_methods!(PresentLoad);
    read_only_methods!(PresentVoltage);
    read_only_methods!(PresentTemperature);
    read_only_methods!(RegisteredInstruction);
    read_only_methods!(Moving);
    read_only_methods!(HardwareErrorStatus);
    control_table_methods!(Lock);
    control_table_methods!(Punch);
}

fn validate(name: RegName, register: Register, value: i32) -> Result<u16, ValidationError> {
    if register.access == Access::ReadOnly {
        return Err(ValidationError::ReadOnly(name));
    }
    match u16::try_from(value) {
        Ok(value) if (register.min..=register.max).contains(&value) => Ok(value),
        _ => Err(ValidationError::OutOfRange {
            register: name,
            value,
            min: register.min,
            max: register.max,
        }),
    }
}
