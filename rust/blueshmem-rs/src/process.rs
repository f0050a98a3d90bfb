use crate::error::Result;
use crate::low_level;

pub use libblueshmem_sys::os::Pid;

/// Which side of a [duplicate] call the current process is on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// The original process, holding the new child's pid
    Parent(Pid),
    /// The newly created process
    Child,
}

impl Role {
    pub(crate) fn from_pid(pid: Pid) -> Self {
        match pid {
            0 => Role::Child,
            child => Role::Parent(child),
        }
    }

    /// Interprets the raw discriminator returned by `blueshmem_fork`
    pub fn from_raw(raw: u32) -> Self {
        Role::from_pid(raw as Pid)
    }

    /// The raw discriminator: `0` in the child, the child's pid in the parent
    pub fn raw(&self) -> u32 {
        match self {
            Role::Parent(child) => *child as u32,
            Role::Child => 0,
        }
    }

    pub fn is_child(&self) -> bool {
        matches!(self, Role::Child)
    }

    /// The pid of the child, if this is the parent
    pub fn child_pid(&self) -> Option<Pid> {
        match self {
            Role::Parent(child) => Some(*child),
            Role::Child => None,
        }
    }
}

/// Duplicates the current process.
///
/// Both processes return from this call, each with its own [Role]. Only
/// memory from a [Flag][crate::Flag], [SharedBuffer][crate::SharedBuffer] or
/// [Channel][crate::Channel] allocated beforehand stays shared; everything
/// else is a private copy.
///
/// If no process can be created a diagnostic is printed and the current
/// process exits; use [try_duplicate] to handle the failure instead.
///
/// Only the calling thread exists in the child. Allocate shared regions
/// before duplicating and avoid duplicating while other threads hold locks.
///
/// # Example
///```no_run
/// use blueshmem_rs::{duplicate, join_any, Role};
///
/// match duplicate() {
///     Role::Child => std::process::exit(0),
///     Role::Parent(child) => {
///         println!("started {child}");
///         join_any();
///     }
/// }
///```
pub fn duplicate() -> Role {
    try_duplicate().unwrap_or_else(|err| err.exit())
}

/// Duplicates the current process, handing back the failure instead of
/// exiting
pub fn try_duplicate() -> Result<Role> {
    low_level::fork()
}

/// Waits until any child of the current process has finished.
///
/// The child's exit status is not collected. If there is nothing to wait for
/// a diagnostic is printed and the call returns.
pub fn join_any() {
    if let Err(err) = try_join_any() {
        err.report();
    }
}

/// Waits until any child has finished, handing back the failure
pub fn try_join_any() -> Result<()> {
    low_level::wait_any()
}
