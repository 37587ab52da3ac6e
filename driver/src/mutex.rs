use std::{cell::RefCell, ops::DerefMut, sync};

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Busy {
    #[error("The Dynamixel bus is already in use")]
    Borrowed,
    #[error("A thread panicked while using the Dynamixel bus")]
    Poisoned,
}

/// Shares one protocol instance between several actuators. `RefCell` suits the usual single
/// coordinating thread; `std::sync::Mutex` serializes callers on different threads.
pub trait Mutex {
    type Item;

    fn new(item: Self::Item) -> Self;

    fn lock(&self) -> Result<impl DerefMut<Target = Self::Item>, Busy>;
}

impl<T> Mutex for RefCell<T> {
    type Item = T;

    #[inline(always)]
    fn new(item: T) -> Self {
        RefCell::new(item)
    }

    #[inline]
    fn lock(&self) -> Result<impl DerefMut<Target = T>, Busy> {
        self.try_borrow_mut().map_err(|_| Busy::Borrowed)
    }
}

impl<T> Mutex for sync::Mutex<T> {
    type Item = T;

    #[inline(always)]
    fn new(item: T) -> Self {
        sync::Mutex::new(item)
    }

    #[inline]
    fn lock(&self) -> Result<impl DerefMut<Target = T>, Busy> {
        sync::Mutex::lock(self).map_err(|_| Busy::Poisoned)
    }
}
