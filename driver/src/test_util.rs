use {
    dynamixel_packet::{
        Framing, Instruction, InstructionPacket, checksum::checksum, constants,
        control_table::{Catalog, RegName},
        v1::V1,
    },
    std::{
        collections::{BTreeMap, VecDeque},
        io,
    },
};

pub enum Event {
    Bytes(Vec<u8>),
    /// One read that yields nothing.
    Idle,
    Fail(io::ErrorKind),
}

/// Transport that plays back scripted reads and records every write.
#[derive(Default)]
pub struct Script {
    events: VecDeque<Event>,
    pending: VecDeque<u8>,
    pub written: Vec<Vec<u8>>,
    pub recv_calls: usize,
}

impl Script {
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl io::Read for Script {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.recv_calls += 1;
        if self.pending.is_empty() {
            match self.events.pop_front() {
                None | Some(Event::Idle) => return Ok(0),
                Some(Event::Fail(kind)) => return Err(kind.into()),
                Some(Event::Bytes(bytes)) => self.pending.extend(bytes),
            }
        }
        let n = buffer.len().min(self.pending.len());
        for (slot, byte) in buffer.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl io::Write for Script {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.written.push(bytes.to_vec());
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Device {
    table: Vec<u8>,
    staged: Option<(usize, Vec<u8>)>,
}

/// Protocol 1.0 devices behind one transport: each keeps a control table, honours its
/// status return level, and holds REG_WRITE data until ACTION.
pub struct SimulatedBus {
    devices: BTreeMap<u8, Device>,
    table_size: usize,
    id: usize,
    return_level: usize,
    replies: VecDeque<u8>,
    pub written: Vec<Vec<u8>>,
}

impl SimulatedBus {
    pub fn new(catalog: &Catalog) -> Self {
        let address = |name| {
            let register = catalog.get(name).expect("Catalog without a required register");
            usize::from(register.address)
        };
        Self {
            devices: BTreeMap::new(),
            table_size: catalog.table_size.into(),
            id: address(RegName::ServoId),
            return_level: address(RegName::StatusReturnLevel),
            replies: VecDeque::new(),
            written: vec![],
        }
    }

    pub fn with_device(mut self, id: u8, return_level: u8) -> Self {
        let mut table = vec![0; self.table_size];
        table[self.id] = id;
        table[self.return_level] = return_level;
        let _ = self.devices.insert(id, Device { table, staged: None });
        self
    }

    pub fn table(&self, id: u8) -> &[u8] {
        &self.devices[&id].table
    }

    pub fn table_mut(&mut self, id: u8) -> &mut [u8] {
        &mut self.devices.get_mut(&id).expect("No such device").table
    }

    pub fn instructions(&self) -> Vec<InstructionPacket> {
        self.written
            .iter()
            .map(|frame| V1::decode_instruction(frame).expect("Malformed instruction"))
            .collect()
    }

    fn reply(&mut self, id: u8, parameters: &[u8]) {
        let mut frame = vec![
            constants::HEADER,
            constants::HEADER,
            id,
            parameters.len() as u8 + 2,
            0x00,
        ];
        frame.extend_from_slice(parameters);
        frame.push(checksum(&frame[2..]));
        self.replies.extend(frame);
    }

    fn execute(&mut self, packet: InstructionPacket) {
        let InstructionPacket {
            id,
            instruction,
            parameters,
        } = packet;
        let instruction = Instruction::from_byte(instruction).expect("Unknown instruction");
        if id == constants::BROADCAST {
            for device in self.devices.values_mut() {
                match instruction {
                    Instruction::Action => {
                        if let Some((address, data)) = device.staged.take() {
                            device.table[address..address + data.len()].copy_from_slice(&data);
                        }
                    }
                    Instruction::Write => {
                        let address = usize::from(parameters[0]);
                        device.table[address..address + parameters.len() - 1]
                            .copy_from_slice(&parameters[1..]);
                    }
                    _ => {}
                }
            }
            self.rekey();
            return;
        }
        let return_level = self.return_level;
        let Some(device) = self.devices.get_mut(&id) else {
            return;
        };
        let reply = match instruction {
            Instruction::Ping => Some(vec![]),
            Instruction::Read => {
                let address = usize::from(parameters[0]);
                let length = usize::from(parameters[1]);
                let data = device.table[address..address + length].to_vec();
                (device.table[return_level] >= 1).then_some(data)
            }
            Instruction::Write => {
                let address = usize::from(parameters[0]);
                device.table[address..address + parameters.len() - 1]
                    .copy_from_slice(&parameters[1..]);
                (device.table[return_level] == 2).then_some(vec![])
            }
            Instruction::RegWrite => {
                device.staged = Some((usize::from(parameters[0]), parameters[1..].to_vec()));
                (device.table[return_level] == 2).then_some(vec![])
            }
            Instruction::Action => None,
        };
        if let Some(parameters) = reply {
            self.reply(id, &parameters);
        }
        self.rekey();
    }

    /// Devices answer to whatever their ID register holds once a write to it takes effect.
    fn rekey(&mut self) {
        let moved: Vec<u8> = self
            .devices
            .iter()
            .filter(|&(&id, device)| device.table[self.id] != id)
            .map(|(&id, _)| id)
            .collect();
        for id in moved {
            if let Some(device) = self.devices.remove(&id) {
                let _ = self.devices.insert(device.table[self.id], device);
            }
        }
    }
}

impl io::Read for SimulatedBus {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let n = buffer.len().min(self.replies.len());
        for (slot, byte) in buffer.iter_mut().zip(self.replies.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl io::Write for SimulatedBus {
    fn write(&mut self, frame: &[u8]) -> io::Result<usize> {
        self.written.push(frame.to_vec());
        let packet = V1::decode_instruction(frame)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.execute(packet);
        Ok(frame.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
