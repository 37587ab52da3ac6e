use {
    crate::{DeviceError, Error, ValidationError, bus::Bus, comm::Comm, config::Config},
    dynamixel_packet::{FrameError, Framing, Generation, Id, Instruction, v1, v2},
    std::{
        marker::PhantomData,
        mem,
        sync::{
            Arc,
            atomic::{AtomicU8, Ordering},
        },
    },
};

/// What became of a write held back until `action`.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Pending = 0,
    Committed = 1,
    Dropped = 2,
}

/// Handed out for each staged write; settled once `action` commits it or it is dropped.
#[derive(Clone, Debug, Default)]
pub struct Receipt(Arc<AtomicU8>);

impl Receipt {
    #[inline]
    pub fn outcome(&self) -> Outcome {
        match self.0.load(Ordering::Acquire) {
            0 => Outcome::Pending,
            1 => Outcome::Committed,
            _ => Outcome::Dropped,
        }
    }

    #[inline(always)]
    fn settle(&self, outcome: Outcome) {
        self.0.store(outcome as u8, Ordering::Release);
    }
}

/// What an actuator needs from the bus, whichever protocol generation is spoken on it.
pub trait Protocol {
    fn generation(&self) -> Generation;

    /// Devices answer PING at every status return level.
    fn ping(&mut self, id: Id) -> Result<(), Error>;

    fn read(&mut self, id: Id, address: u16, length: u16) -> Result<Vec<u8>, Error>;

    /// WRITE, or REG_WRITE held back until `action` while buffered. A held-back write
    /// returns the [`Receipt`] that later tells whether it reached the device.
    fn write(
        &mut self,
        id: Id,
        address: u16,
        data: &[u8],
        expect_response: bool,
    ) -> Result<Option<Receipt>, Error>;

    /// Send every staged REG_WRITE in order, then broadcast ACTION. Their receipts are
    /// committed if all of that succeeds and dropped otherwise.
    fn action(&mut self) -> Result<(), Error>;

    fn set_buffered(&mut self, buffered: bool);

    fn buffered(&self) -> bool;

    /// Drop staged writes without sending them. Returns how many there were.
    fn discard(&mut self) -> usize;

    /// Throw away unread input, e.g. after a framing error.
    fn flush(&mut self) -> Result<usize, Error>;
}

impl<P: Protocol + ?Sized> Protocol for Box<P> {
    #[inline(always)]
    fn generation(&self) -> Generation {
        (**self).generation()
    }

    #[inline(always)]
    fn ping(&mut self, id: Id) -> Result<(), Error> {
        (**self).ping(id)
    }

    #[inline(always)]
    fn read(&mut self, id: Id, address: u16, length: u16) -> Result<Vec<u8>, Error> {
        (**self).read(id, address, length)
    }

    #[inline(always)]
    fn write(
        &mut self,
        id: Id,
        address: u16,
        data: &[u8],
        expect_response: bool,
    ) -> Result<Option<Receipt>, Error> {
        (**self).write(id, address, data, expect_response)
    }

    #[inline(always)]
    fn action(&mut self) -> Result<(), Error> {
        (**self).action()
    }

    #[inline(always)]
    fn set_buffered(&mut self, buffered: bool) {
        (**self).set_buffered(buffered)
    }

    #[inline(always)]
    fn buffered(&self) -> bool {
        (**self).buffered()
    }

    #[inline(always)]
    fn discard(&mut self) -> usize {
        (**self).discard()
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<usize, Error> {
        (**self).flush()
    }
}

#[derive(Debug)]
struct Staged {
    id: Id,
    frame: Vec<u8>,
    expect_response: bool,
    receipt: Receipt,
}

/// [`Protocol`] over a transport for one framing.
#[derive(Debug)]
pub struct Codec<F: Framing, C: Comm> {
    bus: Bus<C>,
    config: Config,
    buffered: bool,
    staged: Vec<Staged>,
    framing: PhantomData<F>,
}

pub type ProtocolV1<C> = Codec<v1::V1, C>;
pub type ProtocolV2<C> = Codec<v2::V2, C>;

/// Pick a codec at runtime.
pub fn open<C: Comm + 'static>(generation: Generation, comm: C, config: Config) -> Box<dyn Protocol> {
    match generation {
        Generation::V1 => Box::new(ProtocolV1::with_config(comm, config)),
        Generation::V2 => Box::new(ProtocolV2::with_config(comm, config)),
    }
}

#[inline]
fn unicast(id: Id) -> Result<(), ValidationError> {
    if id.is_broadcast() {
        Err(ValidationError::Broadcast)
    } else {
        Ok(())
    }
}

impl<F: Framing, C: Comm> Codec<F, C>
where
    DeviceError: From<F::Error>,
{
    #[inline]
    pub fn new(comm: C) -> Self {
        Self::with_config(comm, Config::for_generation(F::GENERATION))
    }

    #[inline]
    pub fn with_config(comm: C, config: Config) -> Self {
        Self {
            bus: Bus::new(comm, config.timeout, config.backoff),
            config,
            buffered: false,
            staged: vec![],
            framing: PhantomData,
        }
    }

    #[inline(always)]
    pub const fn bus(&self) -> &Bus<C> {
        &self.bus
    }

    #[inline(always)]
    pub const fn bus_mut(&mut self) -> &mut Bus<C> {
        &mut self.bus
    }

    #[inline(always)]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    fn transmit(&mut self, id: Id, instruction: Instruction, parameters: &[u8]) -> Result<(), Error> {
        let frame = F::instruction(id, instruction, parameters)?;
        self.bus.send(&frame)
    }

    /// Every staged frame in order, then ACTION to all.
    fn commit(&mut self, staged: &[Staged]) -> Result<(), Error> {
        for &Staged {
            id,
            ref frame,
            expect_response,
            ..
        } in staged
        {
            self.bus.send(frame)?;
            if expect_response {
                let _: Vec<u8> = Self::status(&mut self.bus, self.config.verify_checksums, id)?;
            }
        }
        self.transmit(Id::BROADCAST, Instruction::Action, &[])
    }

    /// Read one status packet and turn it into the parameters of a successful reply.
    fn status(bus: &mut Bus<C>, verify_checksums: bool, id: Id) -> Result<Vec<u8>, Error> {
        let packet = bus.receive(F::parser())?;
        if !packet.checksum_matches() {
            if verify_checksums {
                return Err(Error::Checksum {
                    expected: packet.expected_checksum,
                    actual: packet.checksum,
                });
            }
            log::warn!(
                "Ignoring a bad checksum from Dynamixel ID {}: computed 0x{:04X} but received 0x{:04X}",
                packet.id,
                packet.expected_checksum,
                packet.checksum,
            );
        }
        if let Some(error) = packet.error {
            return Err(Error::Device {
                id: packet.id,
                error: error.into(),
            });
        }
        if id != packet.id {
            return Err(Error::IdentMismatch {
                expected: id,
                actual: packet.id,
            });
        }
        Ok(packet.parameters)
    }
}

impl<F: Framing, C: Comm> Protocol for Codec<F, C>
where
    DeviceError: From<F::Error>,
{
    #[inline(always)]
    fn generation(&self) -> Generation {
        F::GENERATION
    }

    fn ping(&mut self, id: Id) -> Result<(), Error> {
        unicast(id)?;
        log::debug!("Pinging Dynamixel ID {id}");
        let frame = F::instruction(id, Instruction::Ping, &[])?;
        let verify_checksums = self.config.verify_checksums;
        let ping = |bus: &mut Bus<C>| {
            bus.send(&frame)?;
            Self::status(bus, verify_checksums, id).map(drop)
        };
        match self.config.ping_timeout {
            Some(timeout) => self.bus.with_timeout(timeout, ping),
            None => ping(&mut self.bus),
        }
    }

    fn read(&mut self, id: Id, address: u16, length: u16) -> Result<Vec<u8>, Error> {
        unicast(id)?;
        log::debug!("Reading {length} bytes at 0x{address:02X} from Dynamixel ID {id}");
        let parameters = F::read_parameters(address, length)?;
        self.transmit(id, Instruction::Read, &parameters)?;
        let data = Self::status(&mut self.bus, self.config.verify_checksums, id)?;
        if data.len() != usize::from(length) {
            return Err(FrameError::ParameterCount {
                expected: length.into(),
                actual: data.len(),
            }
            .into());
        }
        Ok(data)
    }

    fn write(
        &mut self,
        id: Id,
        address: u16,
        data: &[u8],
        expect_response: bool,
    ) -> Result<Option<Receipt>, Error> {
        let parameters = F::write_parameters(address, data)?;
        let expect_response = expect_response && !id.is_broadcast();
        if self.buffered {
            log::debug!("Staging {data:02X?} at 0x{address:02X} for Dynamixel ID {id}");
            let frame = F::instruction(id, Instruction::RegWrite, &parameters)?;
            let receipt = Receipt::default();
            self.staged.push(Staged {
                id,
                frame,
                expect_response,
                receipt: receipt.clone(),
            });
            return Ok(Some(receipt));
        }
        log::debug!("Writing {data:02X?} at 0x{address:02X} to Dynamixel ID {id}");
        self.transmit(id, Instruction::Write, &parameters)?;
        if expect_response {
            let _: Vec<u8> = Self::status(&mut self.bus, self.config.verify_checksums, id)?;
        }
        Ok(None)
    }

    fn action(&mut self) -> Result<(), Error> {
        let staged = mem::take(&mut self.staged);
        log::debug!("Committing {} staged writes", staged.len());
        let result = self.commit(&staged);
        let outcome = if result.is_ok() {
            Outcome::Committed
        } else {
            Outcome::Dropped
        };
        for &Staged { ref receipt, .. } in &staged {
            receipt.settle(outcome);
        }
        result
    }

    #[inline(always)]
    fn set_buffered(&mut self, buffered: bool) {
        self.buffered = buffered;
    }

    #[inline(always)]
    fn buffered(&self) -> bool {
        self.buffered
    }

    #[inline]
    fn discard(&mut self) -> usize {
        let staged = mem::take(&mut self.staged);
        for &Staged { ref receipt, .. } in &staged {
            receipt.settle(Outcome::Dropped);
        }
        staged.len()
    }

    #[inline(always)]
    fn flush(&mut self) -> Result<usize, Error> {
        self.bus.flush()
    }
}
