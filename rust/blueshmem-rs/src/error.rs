use libblueshmem_sys::diag;
use std::io;

/// A failed OS call, with the `errno` it left behind.
///
/// Only the `try_*` functions hand these back; everything else applies the
/// crate's failure policy directly.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS could not create a new process
    #[error("Fork failed: {0}")]
    Fork(#[source] io::Error),
    /// There was no child to wait for, or the wait itself failed
    #[error("Wait failed: {0}")]
    Wait(#[source] io::Error),
    /// Shared memory could not be mapped
    #[error("Failed to map shared memory: {0}")]
    Map(#[source] io::Error),
    /// The semaphore behind a flag could not be initialized
    #[error("Failed to initialise semaphore: {0}")]
    FlagInit(#[source] io::Error),
    /// The value of a flag could not be read
    #[error("Failed to get semaphore value: {0}")]
    FlagQuery(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The diagnostic prefix for this failure
    pub fn context(&self) -> &'static str {
        match self {
            Error::Fork(_) => diag::FORK_FAILED,
            Error::Wait(_) => diag::WAIT_FAILED,
            Error::Map(_) => diag::MAP_FAILED,
            Error::FlagInit(_) => diag::SEM_INIT_FAILED,
            Error::FlagQuery(_) => diag::SEM_VALUE_FAILED,
        }
    }

    /// The underlying OS error
    pub fn os_error(&self) -> &io::Error {
        match self {
            Error::Fork(err)
            | Error::Wait(err)
            | Error::Map(err)
            | Error::FlagInit(err)
            | Error::FlagQuery(err) => err,
        }
    }

    /// Prints the diagnostic and terminates the process
    pub(crate) fn exit(self) -> ! {
        diag::fatal(self.context(), self.os_error())
    }

    /// Prints the diagnostic and carries on
    pub(crate) fn report(&self) {
        diag::report(self.context(), self.os_error())
    }
}
