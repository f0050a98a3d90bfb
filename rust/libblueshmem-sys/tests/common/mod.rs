#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

// wait() reaps any child, so tests that fork must not overlap
static FORK_LOCK: Mutex<()> = Mutex::new(());

pub fn serialize() -> MutexGuard<'static, ()> {
    FORK_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reaps `pid` and returns its exit code, `None` if it did not exit normally
pub fn exit_status(pid: libc::pid_t) -> Option<i32> {
    let mut status = 0;
    let reaped = unsafe { libc::waitpid(pid, &mut status, 0) };
    assert_eq!(reaped, pid, "waitpid failed");
    if libc::WIFEXITED(status) {
        Some(libc::WEXITSTATUS(status))
    } else {
        None
    }
}

/// Leaves a forked test child without running the test harness any further
pub fn child_exit(ok: bool) -> ! {
    unsafe { libc::_exit(if ok { 0 } else { 1 }) }
}

/// Runs `f` in a forked child with its stderr piped back to the caller.
///
/// Returns the child's exit code and everything it wrote to stderr. A child
/// that survives `f` exits with 99.
pub fn run_in_child(f: impl FnOnce()) -> (Option<i32>, String) {
    use fork::{fork, Fork};
    use std::fs::File;
    use std::io::Read;
    use std::os::unix::io::FromRawFd;

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
            let mut stderr = String::new();
            let mut pipe = unsafe { File::from_raw_fd(read_fd) };
            pipe.read_to_string(&mut stderr).unwrap();
            (exit_status(child), stderr)
        }
        Err(e) => panic!("test harness could not fork: {e}"),
    }
}
