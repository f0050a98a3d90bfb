use crate::error::Result;
use crate::low_level;

use libblueshmem_sys::DEFAULT_FLAG_VALUE;
use std::ptr::NonNull;

/// This structure is used to set up a [Flag] with the given parameters
/// # Example
///```
/// use blueshmem_rs::FlagBuilder;
///
/// let flag = FlagBuilder::new()
///                 .initial(0)
///                 .allocate();
/// assert_eq!(flag.value(), 0);
///```
pub struct FlagBuilder {
    initial: u32,
}

impl FlagBuilder {
    /// Creates and returns a new FlagBuilder starting at the default value of 1
    pub fn new() -> FlagBuilder {
        FlagBuilder {
            initial: DEFAULT_FLAG_VALUE,
        }
    }

    /// Set the value the flag starts at
    ///
    /// ## Arguments
    ///
    /// * `value` - The initial value. 1 makes the flag usable as a lock, 0 as
    ///   a "data ready" signal.
    pub fn initial(mut self, value: u32) -> FlagBuilder {
        self.initial = value;
        self
    }

    /// Allocates the flag in shared memory.
    ///
    /// If the flag cannot be created a diagnostic is printed and the process
    /// exits; see [FlagBuilder::try_allocate].
    pub fn allocate(self) -> Flag {
        self.try_allocate().unwrap_or_else(|err| err.exit())
    }

    /// Allocates the flag in shared memory, handing back the failure
    pub fn try_allocate(self) -> Result<Flag> {
        let sem = low_level::sem_create(self.initial)?;
        Ok(Flag { sem })
    }
}

impl Default for FlagBuilder {
    fn default() -> Self {
        FlagBuilder::new()
    }
}

/// A counting flag shared between a process and the processes duplicated
/// from it.
///
/// The value never drops below zero: [Flag::decrement_blocking] suspends the
/// caller while it is zero, [Flag::increment] never blocks. A `Flag` is a
/// plain handle; copies refer to the same flag and there is no owner. The
/// memory behind it lives until the process exits.
///
/// # Example
///```
/// use blueshmem_rs::Flag;
///
/// let flag = Flag::new();
/// assert_eq!(flag.value(), 1);
/// flag.decrement_blocking();
/// assert_eq!(flag.value(), 0);
/// flag.increment();
/// assert_eq!(flag.value(), 1);
///```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Flag {
    sem: NonNull<libc::sem_t>,
}

// A process-shared semaphore is safe to use from any thread
unsafe impl Send for Flag {}
unsafe impl Sync for Flag {}

impl Flag {
    /// Allocates a flag starting at 1, exiting the process on failure
    pub fn new() -> Flag {
        FlagBuilder::new().allocate()
    }

    /// Allocates a flag starting at 1, handing back the failure
    pub fn try_new() -> Result<Flag> {
        FlagBuilder::new().try_allocate()
    }

    /// Start configuring a flag
    pub fn builder() -> FlagBuilder {
        FlagBuilder::new()
    }

    /// Returns the current value without blocking or changing it.
    ///
    /// If the value cannot be read a diagnostic is printed and the process
    /// exits.
    pub fn value(&self) -> u32 {
        self.try_value().unwrap_or_else(|err| err.exit())
    }

    pub fn try_value(&self) -> Result<u32> {
        low_level::sem_value(self.sem)
    }

    /// Adds one, waking at most one process blocked in
    /// [Flag::decrement_blocking]
    pub fn increment(&self) {
        low_level::sem_post(self.sem)
    }

    /// Takes one, first waiting for as long as the value is zero.
    ///
    /// There is no timeout and no way to cancel the wait.
    pub fn decrement_blocking(&self) {
        low_level::sem_wait(self.sem)
    }

    /// The flag's address, as used by the `blueshmem_flag_*` functions
    pub fn as_raw(&self) -> u64 {
        self.sem.as_ptr() as u64
    }

    /// Wraps a handle obtained from the C interface.
    ///
    /// Returns `None` for a null handle.
    ///
    /// # Safety
    ///
    /// `raw` must come from `blueshmem_flag_allocate`,
    /// `blueshmem_flag_allocate_init` or [Flag::as_raw].
    pub unsafe fn from_raw(raw: u64) -> Option<Flag> {
        NonNull::new(raw as usize as *mut libc::sem_t).map(|sem| Flag { sem })
    }
}

impl Default for Flag {
    fn default() -> Self {
        Flag::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_handle_round_trip() {
        let flag = Flag::new();
        let same = unsafe { Flag::from_raw(flag.as_raw()) }.unwrap();
        assert_eq!(flag, same);
        same.increment();
        assert_eq!(flag.value(), 2);
        assert!(unsafe { Flag::from_raw(0) }.is_none());
    }

    #[test]
    fn builder_defaults_to_one() {
        assert_eq!(FlagBuilder::default().allocate().value(), 1);
        assert_eq!(Flag::builder().initial(7).allocate().value(), 7);
    }

    #[test]
    fn raw_handle_works_with_c_interface() {
        let flag = Flag::builder().initial(2).allocate();
        unsafe {
            libblueshmem_sys::blueshmem_flag_dec_wait(flag.as_raw());
            assert_eq!(libblueshmem_sys::blueshmem_flag_val(flag.as_raw()), 1);
        }
        assert_eq!(flag.value(), 1);
    }
}
