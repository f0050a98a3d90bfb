//! Fallible wrappers around the OS primitives.
//!
//! Every function here reports failure as a [std::io::Error] built from
//! `errno` and leaves the choice between terminating and carrying on to the
//! caller. The exported `blueshmem_*` symbols and the safe bindings apply
//! that policy on top of these wrappers.

use std::io;
use std::mem::size_of;
use std::ptr::{self, NonNull};

/// Process identifier as handed out by the OS
pub type Pid = libc::pid_t;

/// Duplicates the calling process.
///
/// Returns `0` in the child and the child's pid in the parent.
pub fn fork() -> io::Result<Pid> {
    let pid = unsafe { libc::fork() };
    if pid < 0 {
        return Err(io::Error::last_os_error());
    }
    log::debug!("forked, fork returned {}", pid);
    Ok(pid)
}

/// Blocks until any child of the calling process has terminated.
///
/// The wait is restarted if a signal interrupts it. Returns the pid of the
/// reaped child; fails with `ECHILD` when there is nothing to wait for.
pub fn wait_any() -> io::Result<Pid> {
    loop {
        let pid = unsafe { libc::wait(ptr::null_mut()) };
        if pid >= 0 {
            log::debug!("reaped child {}", pid);
            return Ok(pid);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

/// Maps `len` bytes of anonymous memory readable and writable by this
/// process and by every process later duplicated from it.
///
/// The OS hands the pages out zero filled. The mapping is never released.
pub fn map_shared(len: usize) -> io::Result<NonNull<libc::c_void>> {
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(io::Error::last_os_error());
    }
    log::debug!("mapped {} shared bytes at {:p}", len, addr);
    // mmap never hands back address zero without MAP_FIXED
    NonNull::new(addr).ok_or_else(|| io::Error::from(io::ErrorKind::AddrNotAvailable))
}

/// Maps room for one semaphore in shared memory.
pub fn map_semaphore() -> io::Result<NonNull<libc::sem_t>> {
    map_shared(size_of::<libc::sem_t>()).map(|addr| addr.cast())
}

/// Initializes a process-shared semaphore with the given value.
///
/// # Safety
///
/// `sem` must point to writable memory large enough for a `sem_t` that no
/// other process is using as a semaphore yet.
pub unsafe fn sem_init(sem: NonNull<libc::sem_t>, value: u32) -> io::Result<()> {
    if libc::sem_init(sem.as_ptr(), 1, value) != 0 {
        return Err(io::Error::last_os_error());
    }
    log::debug!("semaphore {:p} initialized to {}", sem, value);
    Ok(())
}

/// Reads the current value of a semaphore without changing it.
///
/// # Safety
///
/// `sem` must point to a semaphore initialized with [sem_init].
pub unsafe fn sem_getvalue(sem: NonNull<libc::sem_t>) -> io::Result<u32> {
    let mut sval: libc::c_int = 0;
    if libc::sem_getvalue(sem.as_ptr(), &mut sval) != 0 {
        return Err(io::Error::last_os_error());
    }
    // Linux reports 0, never a negative waiter count
    Ok(sval.max(0) as u32)
}

/// Increments a semaphore, waking one blocked waiter if there is one.
///
/// # Safety
///
/// `sem` must point to a semaphore initialized with [sem_init].
pub unsafe fn sem_post(sem: NonNull<libc::sem_t>) -> io::Result<()> {
    log::trace!("post {:p}", sem);
    if libc::sem_post(sem.as_ptr()) != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Decrements a semaphore, suspending the caller while its value is zero.
///
/// There is no timeout. A signal delivered while suspended restarts the wait
/// instead of returning without the decrement.
///
/// # Safety
///
/// `sem` must point to a semaphore initialized with [sem_init].
pub unsafe fn sem_wait(sem: NonNull<libc::sem_t>) -> io::Result<()> {
    log::trace!("wait {:p}", sem);
    loop {
        if libc::sem_wait(sem.as_ptr()) == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}
