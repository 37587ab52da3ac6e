pub enum Status<Output, Incomplete> {
    Complete(Output),
    Incomplete(Incomplete),
}

/// Byte-at-a-time parser.
pub trait State: Sized {
    type Output;
    type Error;

    /// Bytes that will certainly be consumed before the parser can finish or change course.
    /// Never zero while incomplete, so a reader can request exactly this many at once.
    fn wants(&self) -> usize;

    fn push(self, input: u8) -> Result<Status<Self::Output, Self>, Self::Error>;
}

/// Push every byte of `input` in order. Bytes after completion are ignored; feeding
/// exactly `wants()` bytes at a time never leaves any.
#[inline]
pub fn feed<S: State>(mut state: S, input: &[u8]) -> Result<Status<S::Output, S>, S::Error> {
    for &byte in input {
        state = match state.push(byte)? {
            Status::Complete(output) => return Ok(Status::Complete(output)),
            Status::Incomplete(updated) => updated,
        };
    }
    Ok(Status::Incomplete(state))
}
