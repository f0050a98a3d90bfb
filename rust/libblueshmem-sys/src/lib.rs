//! Flat C ABI over `fork`, `wait` and anonymous shared memory.
//!
//! The exported `blueshmem_*` functions are meant to be called from a host
//! language that has no direct access to these primitives. Handles are raw
//! addresses passed around as `u64`; the host is responsible for pairing a
//! flag with a buffer and for agreeing on buffer sizes between processes.
//!
//! Flags and buffers live in shared anonymous mappings, so they must be
//! allocated *before* [blueshmem_fork] for both processes to see them. They
//! are never freed; the OS reclaims them when the process exits.
//!
//! Failure policy:
//! * failing to create a process, initialize a flag or read a flag's value
//!   prints a diagnostic and terminates the process,
//! * failing to wait prints a diagnostic and returns,
//! * everything else reports nothing.
//!
//! Rust callers that would rather see a `Result` can use the [os] module, or
//! the safe bindings built on top of this crate.

use std::io;
use std::mem::size_of;
use std::ptr::{self, NonNull};

pub mod diag;
pub mod logging;
pub mod os;

use os::Pid;

/// Value a flag starts at when allocated with [blueshmem_flag_allocate]
pub const DEFAULT_FLAG_VALUE: u32 = 1;

// -- Process control --

/// Duplicates the calling process.
///
/// Returns `0` in the child and the child's pid in the parent. Terminates the
/// process with a diagnostic if no process can be created.
#[no_mangle]
pub extern "C" fn blueshmem_fork() -> u32 {
    fork_or_exit(os::fork)
}

pub(crate) fn fork_or_exit(fork: impl FnOnce() -> io::Result<Pid>) -> u32 {
    match fork() {
        Ok(pid) => pid as u32,
        Err(err) => diag::fatal(diag::FORK_FAILED, &err),
    }
}

/// Blocks until any child process has finished.
///
/// A failure, such as there being no child to wait for, is reported on
/// standard error and the call returns normally.
#[no_mangle]
pub extern "C" fn blueshmem_wait() {
    if let Err(err) = os::wait_any() {
        diag::report(diag::WAIT_FAILED, &err);
    }
}

// -- Flags --

/// Allocates a flag in shared memory, initialized to [DEFAULT_FLAG_VALUE].
///
/// Returns the flag's address. Terminates the process with a diagnostic if
/// the flag cannot be created.
#[no_mangle]
pub extern "C" fn blueshmem_flag_allocate() -> u64 {
    blueshmem_flag_allocate_init(DEFAULT_FLAG_VALUE)
}

/// Allocates a flag in shared memory, initialized to `initial`.
///
/// Returns the flag's address. Terminates the process with a diagnostic if
/// the flag cannot be created.
#[no_mangle]
pub extern "C" fn blueshmem_flag_allocate_init(initial: u32) -> u64 {
    flag_allocate_or_exit(os::map_semaphore, |sem| unsafe {
        os::sem_init(sem, initial)
    })
}

pub(crate) fn flag_allocate_or_exit(
    map: impl FnOnce() -> io::Result<NonNull<libc::sem_t>>,
    init: impl FnOnce(NonNull<libc::sem_t>) -> io::Result<()>,
) -> u64 {
    let sem = match map() {
        Ok(sem) => sem,
        Err(err) => diag::fatal(diag::MAP_FAILED, &err),
    };
    if let Err(err) = init(sem) {
        diag::fatal(diag::SEM_INIT_FAILED, &err);
    }
    sem.as_ptr() as u64
}

/// Returns the current value of a flag without blocking or changing it.
///
/// Terminates the process with a diagnostic if the value cannot be read.
///
/// # Safety
///
/// `sem_addr` must be a handle returned by one of the flag allocators.
#[no_mangle]
pub unsafe extern "C" fn blueshmem_flag_val(sem_addr: u64) -> u32 {
    let result = match sem_from_addr(sem_addr) {
        Some(sem) => os::sem_getvalue(sem),
        None => Err(io::Error::from_raw_os_error(libc::EINVAL)),
    };
    match result {
        Ok(value) => value,
        Err(err) => diag::fatal(diag::SEM_VALUE_FAILED, &err),
    }
}

/// Increments a flag, waking one process blocked in
/// [blueshmem_flag_dec_wait] if there is one. Never blocks.
///
/// # Safety
///
/// `sem_addr` must be a handle returned by one of the flag allocators.
#[no_mangle]
pub unsafe extern "C" fn blueshmem_flag_inc(sem_addr: u64) {
    if let Some(sem) = sem_from_addr(sem_addr) {
        if let Err(err) = os::sem_post(sem) {
            log::warn!("post on {:p} failed: {}", sem, err);
        }
    }
}

/// Decrements a flag, first waiting for as long as it takes for the value to
/// be above zero. There is no timeout.
///
/// # Safety
///
/// `sem_addr` must be a handle returned by one of the flag allocators.
#[no_mangle]
pub unsafe extern "C" fn blueshmem_flag_dec_wait(sem_addr: u64) {
    if let Some(sem) = sem_from_addr(sem_addr) {
        if let Err(err) = os::sem_wait(sem) {
            log::warn!("wait on {:p} failed: {}", sem, err);
        }
    }
}

fn sem_from_addr(sem_addr: u64) -> Option<NonNull<libc::sem_t>> {
    NonNull::new(sem_addr as usize as *mut libc::sem_t)
}

// -- Buffers --

/// Allocates a shared buffer of `nint` 32 bit integers, zero filled.
///
/// Returns the buffer's address, or `0` if the memory could not be mapped.
/// A buffer of zero integers gets a non-zero handle that is never
/// dereferenced.
#[no_mangle]
pub extern "C" fn blueshmem_allocate(nint: u32) -> u64 {
    if nint == 0 {
        return NonNull::<u32>::dangling().as_ptr() as u64;
    }
    match os::map_shared(nint as usize * size_of::<u32>()) {
        Ok(addr) => addr.as_ptr() as u64,
        Err(err) => {
            log::warn!("{}", diag::message(diag::MAP_FAILED, &err));
            0
        }
    }
}

/// Copies `nint` integers from `data` to the start of a shared buffer.
///
/// Nothing is locked; pair the buffer with a flag to keep the other process
/// from reading while this runs.
///
/// # Safety
///
/// `buf_addr` must be a handle returned by [blueshmem_allocate] for at least
/// `nint` integers and `data` must be readable for `nint` integers. Neither
/// is checked; writing past the end of the buffer is undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn blueshmem_write(buf_addr: u64, data: *const u32, nint: u32) {
    if nint == 0 || data.is_null() || buf_addr == 0 {
        return;
    }
    ptr::copy_nonoverlapping(data, buf_addr as usize as *mut u32, nint as usize);
}

/// Copies `nint` integers from the start of a shared buffer into `data`.
///
/// # Safety
///
/// `buf_addr` must be a handle returned by [blueshmem_allocate] for at least
/// `nint` integers and `data` must be writable for `nint` integers. Neither
/// is checked; reading past the end of the buffer is undefined behavior.
#[no_mangle]
pub unsafe extern "C" fn blueshmem_read(data: *mut u32, buf_addr: u64, nint: u32) {
    if nint == 0 || data.is_null() || buf_addr == 0 {
        return;
    }
    ptr::copy_nonoverlapping(buf_addr as usize as *const u32, data, nint as usize);
}

// -- Logging --

/// Installs a logger writing to standard error, at the level named by the
/// `BLUESHMEM_LOG_LEVEL` environment variable (`info` when unset).
///
/// Calling it again, or after the host installed its own logger, does
/// nothing.
#[no_mangle]
pub extern "C" fn blueshmem_log_init() {
    logging::init_from_env();
}

#[cfg(test)]
mod tests {
    use super::*;
    use fork::{fork, Fork};
    use std::fs::File;
    use std::io::Read;
    use std::os::unix::io::FromRawFd;

    fn exit_status(pid: Pid) -> Option<i32> {
        let mut status = 0;
        unsafe {
            assert_eq!(libc::waitpid(pid, &mut status, 0), pid);
        }
        if libc::WIFEXITED(status) {
            Some(libc::WEXITSTATUS(status))
        } else {
            None
        }
    }

    /// Runs `f` in a forked child with its stderr piped back.
    ///
    /// Returns the child's exit code and everything it wrote to stderr. A
    /// child that survives `f` exits with 99.
    fn run_in_child(f: impl FnOnce()) -> (Option<i32>, String) {
        let mut fds = [0; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let (read_fd, write_fd) = (fds[0], fds[1]);

        match fork() {
            Ok(Fork::Child) => unsafe {
                libc::close(read_fd);
                libc::dup2(write_fd, libc::STDERR_FILENO);
                f();
                libc::_exit(99);
            },
            Ok(Fork::Parent(child)) => {
                unsafe { libc::close(write_fd) };
                let mut diagnostic = String::new();
                let mut pipe = unsafe { File::from_raw_fd(read_fd) };
                pipe.read_to_string(&mut diagnostic).unwrap();
                (exit_status(child), diagnostic)
            }
            Err(e) => panic!("test harness could not fork: {e}"),
        }
    }

    #[test]
    fn failed_fork_terminates_with_diagnostic() {
        let (status, diagnostic) = run_in_child(|| {
            fork_or_exit(|| Err(io::Error::from_raw_os_error(libc::EAGAIN)));
        });

        assert_eq!(status, Some(diag::FATAL_EXIT_CODE));
        assert!(
            diagnostic.starts_with(diag::FORK_FAILED),
            "unexpected diagnostic: {diagnostic:?}"
        );
    }

    #[test]
    fn failed_flag_init_terminates_with_diagnostic() {
        let (status, diagnostic) = run_in_child(|| {
            flag_allocate_or_exit(os::map_semaphore, |_| {
                Err(io::Error::from_raw_os_error(libc::EINVAL))
            });
        });

        assert_eq!(status, Some(diag::FATAL_EXIT_CODE));
        assert!(
            diagnostic.starts_with(diag::SEM_INIT_FAILED),
            "unexpected diagnostic: {diagnostic:?}"
        );
        assert!(diagnostic.contains("Invalid argument"));
    }

    #[test]
    fn failed_flag_mapping_terminates_with_diagnostic() {
        let (status, diagnostic) = run_in_child(|| {
            flag_allocate_or_exit(
                || Err(io::Error::from_raw_os_error(libc::ENOMEM)),
                |_| unreachable!("nothing was mapped"),
            );
        });

        assert_eq!(status, Some(diag::FATAL_EXIT_CODE));
        assert!(
            diagnostic.starts_with(diag::MAP_FAILED),
            "unexpected diagnostic: {diagnostic:?}"
        );
    }

    #[test]
    fn initialized_flag_handle_is_the_mapping() {
        let mut mapped = None;
        let handle = flag_allocate_or_exit(
            || {
                let sem = os::map_semaphore()?;
                mapped = Some(sem);
                Ok(sem)
            },
            |sem| unsafe { os::sem_init(sem, 7) },
        );
        assert_eq!(Some(handle), mapped.map(|sem| sem.as_ptr() as u64));
        assert_eq!(unsafe { blueshmem_flag_val(handle) }, 7);
    }

    #[test]
    fn successful_fork_passes_pid_through() {
        assert_eq!(fork_or_exit(|| Ok(0)), 0);
        assert_eq!(fork_or_exit(|| Ok(4242)), 4242);
    }

    #[test]
    fn empty_buffer_handle_is_not_null() {
        let buf = blueshmem_allocate(0);
        assert_ne!(buf, 0);
        let mut out: [u32; 0] = [];
        unsafe {
            blueshmem_write(buf, [0u32; 0].as_ptr(), 0);
            blueshmem_read(out.as_mut_ptr(), buf, 0);
        }
    }
}
