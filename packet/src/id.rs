use {crate::constants, core::fmt};

/// Device ID on the bus. `0xFF` is indistinguishable from a header byte and is never valid;
/// `0xFE` is the broadcast ID.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Id(u8);

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[error("invalid Dynamixel ID: {0}")]
pub struct InvalidId(pub u8);

impl Id {
    pub const BROADCAST: Self = Self(constants::BROADCAST);

    #[inline]
    pub const fn new(raw: u8) -> Result<Self, InvalidId> {
        if raw == constants::HEADER {
            Err(InvalidId(raw))
        } else {
            Ok(Self(raw))
        }
    }

    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn is_broadcast(self) -> bool {
        self.0 == constants::BROADCAST
    }
}

impl TryFrom<u8> for Id {
    type Error = InvalidId;

    #[inline(always)]
    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Id> for u8 {
    #[inline(always)]
    fn from(id: Id) -> Self {
        id.0
    }
}

impl PartialEq<u8> for Id {
    #[inline(always)]
    fn eq(&self, other: &u8) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Id {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            f.write_str("broadcast")
        } else {
            fmt::Display::fmt(&self.0, f)
        }
    }
}

#[cfg(test)]
mod test {
    use {super::*, quickcheck_macros::quickcheck};

    #[quickcheck]
    fn only_header_byte_is_rejected(raw: u8) -> bool {
        Id::new(raw).is_ok() == (raw != 0xFF)
    }

    #[test]
    fn broadcast() {
        assert_eq!(Id::new(0xFE), Ok(Id::BROADCAST));
        assert!(Id::BROADCAST.is_broadcast());
        assert_eq!(Id::BROADCAST.to_string(), "broadcast");
        assert_eq!(Id::new(7).unwrap().to_string(), "7");
    }
}
