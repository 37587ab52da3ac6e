//! Moving several devices in the same instant over a half-duplex bus.

use crate::{Error, mutex::Mutex, protocol::Protocol};

/// Run `f` with every write on `bus` held back, then release them all with one broadcast
/// ACTION. If `f` fails, the held writes are dropped instead.
///
/// The bus is not locked while `f` runs, so actuators sharing it can be used as usual.
/// Nested calls leave committing to the outermost one.
pub fn synchronized<M, T>(bus: &M, f: impl FnOnce() -> Result<T, Error>) -> Result<T, Error>
where
    M: Mutex<Item: Protocol>,
{
    let was_buffered = {
        let mut protocol = bus.lock()?;
        let was_buffered = protocol.buffered();
        protocol.set_buffered(true);
        was_buffered
    };
    let output = f();
    let mut protocol = bus.lock()?;
    protocol.set_buffered(was_buffered);
    if was_buffered {
        return output;
    }
    match output {
        Ok(output) => {
            protocol.action()?;
            Ok(output)
        }
        Err(e) => {
            let discarded = protocol.discard();
            log::warn!("Dropping {discarded} staged writes: {e}");
            Err(e)
        }
    }
}
