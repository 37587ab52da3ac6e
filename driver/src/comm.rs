use std::io;

/// Raw byte duplex to the bus: a serial port, a USB adapter, a socket.
///
/// `recv` returning zero bytes only means nothing has arrived yet, and so does an error
/// for which [`is_idle`] holds. Every other error is fatal.
pub trait Comm {
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize>;
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
}

impl<T: io::Read + io::Write> Comm for T {
    #[inline]
    fn send(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let n = self.write(bytes)?;
        self.flush()?;
        Ok(n)
    }

    #[inline(always)]
    fn recv(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.read(buffer)
    }
}

/// Serial ports report an empty read timeout as an error rather than `Ok(0)`.
#[inline]
pub fn is_idle(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
