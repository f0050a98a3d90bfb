use libblueshmem_sys::os;
use std::io;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use crate::error::{Error, Result};
use crate::process::Role;

/// Duplicates the current process
pub(crate) fn fork() -> Result<Role> {
    os::fork().map(Role::from_pid).map_err(Error::Fork)
}

/// Waits for any child to finish
pub(crate) fn wait_any() -> Result<()> {
    os::wait_any().map(|_| ()).map_err(Error::Wait)
}

/// Maps a shared semaphore and initializes it to `initial`
pub(crate) fn sem_create(initial: u32) -> Result<NonNull<libc::sem_t>> {
    let sem = os::map_semaphore().map_err(Error::Map)?;
    unsafe { os::sem_init(sem, initial) }.map_err(Error::FlagInit)?;
    Ok(sem)
}

/// Get the current value of a semaphore
///
/// ## Arguments
///
/// * `sem` - A semaphore created by [sem_create]
pub(crate) fn sem_value(sem: NonNull<libc::sem_t>) -> Result<u32> {
    unsafe { os::sem_getvalue(sem) }.map_err(Error::FlagQuery)
}

pub(crate) fn sem_post(sem: NonNull<libc::sem_t>) {
    if let Err(err) = unsafe { os::sem_post(sem) } {
        // only EOVERFLOW is possible on a valid semaphore
        log::warn!("post on {:p} failed: {}", sem, err);
    }
}

pub(crate) fn sem_wait(sem: NonNull<libc::sem_t>) {
    if let Err(err) = unsafe { os::sem_wait(sem) } {
        log::warn!("wait on {:p} failed: {}", sem, err);
    }
}

/// Maps a zero filled shared region holding `len` integers
///
/// A zero length region is never mapped; the returned pointer is dangling but
/// aligned.
pub(crate) fn map_buffer(len: usize) -> Result<NonNull<u32>> {
    if len == 0 {
        return Ok(NonNull::dangling());
    }
    let bytes = len
        .checked_mul(size_of::<u32>())
        .ok_or_else(|| Error::Map(io::Error::from(io::ErrorKind::InvalidInput)))?;
    let addr = os::map_shared(bytes).map_err(Error::Map)?;
    Ok(addr.cast())
}

/// Copy `src` to the start of the region at `dst`
///
/// # Safety
///
/// `dst` must be valid for `src.len()` integers.
pub(crate) unsafe fn copy_in(dst: NonNull<u32>, src: &[u32]) {
    ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len());
}

/// Copy the start of the region at `src` into `dst`
///
/// # Safety
///
/// `src` must be valid for `dst.len()` integers.
pub(crate) unsafe fn copy_out(dst: &mut [u32], src: NonNull<u32>) {
    ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr(), dst.len());
}
