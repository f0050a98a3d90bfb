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
