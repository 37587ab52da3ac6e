use {
    crate::{
        Error,
        comm::{self, Comm},
    },
    dynamixel_packet::{
        FrameError,
        parse::{self, State, Status},
    },
    std::{
        io, mem, thread,
        time::{Duration, Instant},
    },
};

/// Blocking access to the bus: whole-frame writes, and reads that wait for exactly the
/// requested number of bytes or give up at a deadline.
#[derive(Debug)]
pub struct Bus<C: Comm> {
    comm: C,
    timeout: Duration,
    backoff: Duration,
}

impl<C: Comm> Bus<C> {
    #[inline(always)]
    pub const fn new(comm: C, timeout: Duration, backoff: Duration) -> Self {
        Self {
            comm,
            timeout,
            backoff,
        }
    }

    #[inline(always)]
    pub const fn comm(&self) -> &C {
        &self.comm
    }

    #[inline(always)]
    pub const fn comm_mut(&mut self) -> &mut C {
        &mut self.comm
    }

    #[inline(always)]
    pub fn into_inner(self) -> C {
        self.comm
    }

    #[inline(always)]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline(always)]
    pub const fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Run `f` with a different read deadline, restoring the current one however `f` ends.
    #[inline]
    pub fn with_timeout<T>(&mut self, timeout: Duration, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = mem::replace(&mut self.timeout, timeout);
        let output = f(self);
        self.timeout = previous;
        output
    }

    pub fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        log::trace!(">> {bytes:02X?}");
        let mut sent = 0;
        while sent < bytes.len() {
            match self.comm.send(&bytes[sent..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Exactly `count` bytes, sleeping with exponential backoff whenever nothing arrives.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        let start = Instant::now();
        let mut buffer = vec![0; count];
        let mut received = 0;
        let mut retry = self.backoff;
        while received < count {
            let n = match self.comm.recv(&mut buffer[received..]) {
                Ok(n) => n,
                Err(e) if comm::is_idle(&e) => 0,
                Err(e) => return Err(e.into()),
            };
            received += n;
            if received == count {
                break;
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                return Err(Error::ReadTimeout {
                    expected: count,
                    received,
                    timeout: self.timeout,
                });
            }
            if n == 0 {
                thread::sleep(retry.min(self.timeout - elapsed));
                retry = retry.saturating_mul(2);
            }
        }
        log::trace!("<< {buffer:02X?}");
        Ok(buffer)
    }

    /// Drive a status parser to completion, reading exactly as much as it asks for.
    pub fn receive<S: State<Error = FrameError>>(&mut self, mut state: S) -> Result<S::Output, Error> {
        loop {
            let chunk = self.read(state.wants())?;
            state = match parse::feed(state, &chunk)? {
                Status::Complete(output) => return Ok(output),
                Status::Incomplete(updated) => updated,
            };
        }
    }

    /// Discard whatever is waiting to be read. Returns how many bytes that was.
    pub fn flush(&mut self) -> Result<usize, Error> {
        let mut buffer = [0; 64];
        let mut discarded = 0;
        loop {
            match self.comm.recv(&mut buffer) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(e) if comm::is_idle(&e) => break,
                Err(e) => return Err(e.into()),
            }
        }
        if discarded != 0 {
            log::debug!("Discarded {discarded} stray bytes");
        }
        Ok(discarded)
    }
}
