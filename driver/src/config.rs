use {dynamixel_packet::Generation, std::time::Duration};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Deadline for each read of a status packet fragment.
    pub timeout: Duration,
    /// Replaces `timeout` while waiting for a PING reply.
    pub ping_timeout: Option<Duration>,
    /// First sleep after a read comes back empty; doubles on each retry.
    pub backoff: Duration,
    /// Reject status packets whose checksum or CRC does not match instead of logging them.
    pub verify_checksums: bool,
}

impl Config {
    #[inline]
    pub const fn v1() -> Self {
        Self {
            timeout: Duration::from_millis(128),
            ping_timeout: None,
            backoff: Duration::from_millis(1),
            verify_checksums: false,
        }
    }

    /// Protocol 2.0 devices answer quickly, except XL-320 PING replies.
    #[inline]
    pub const fn v2() -> Self {
        Self {
            timeout: Duration::from_millis(10),
            ping_timeout: Some(Duration::from_secs(2)),
            backoff: Duration::from_millis(1),
            verify_checksums: false,
        }
    }

    #[inline]
    pub const fn for_generation(generation: Generation) -> Self {
        match generation {
            Generation::V1 => Self::v1(),
            Generation::V2 => Self::v2(),
        }
    }

    #[inline(always)]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline(always)]
    pub const fn with_ping_timeout(mut self, ping_timeout: Option<Duration>) -> Self {
        self.ping_timeout = ping_timeout;
        self
    }

    #[inline(always)]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    #[inline(always)]
    pub const fn with_verify_checksums(mut self, verify_checksums: bool) -> Self {
        self.verify_checksums = verify_checksums;
        self
    }
}
