//! Bytes fixed by the wire format.

/// Both leading bytes of a protocol 1.0 packet, and the first two of protocol 2.0.
pub const HEADER: u8 = 0xFF;

/// `FF FF FD` followed by the reserved byte.
pub const V2_HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

/// Addresses every device at once; never answered with a status packet.
pub const BROADCAST: u8 = 0xFE;

/// Instruction byte of every protocol 2.0 status packet.
pub const STATUS: u8 = 0x55;
