use libblueshmem_sys::*;
use std::thread;
use std::time::Duration;

mod common;

#[test]
fn wait_returns_after_the_only_child_exits() {
    let _guard = common::serialize();

    let marker = blueshmem_allocate(1);
    let pid = blueshmem_fork();
    if pid == 0 {
        thread::sleep(Duration::from_millis(100));
        unsafe { blueshmem_write(marker, [7].as_ptr(), 1) };
        common::child_exit(true);
    }
    assert_ne!(pid, 0);

    blueshmem_wait();

    let mut seen = [0u32];
    unsafe { blueshmem_read(seen.as_mut_ptr(), marker, 1) };
    assert_eq!(seen, [7]);

    // exactly one child was created, and it has been reaped
    let again = unsafe { libc::wait(std::ptr::null_mut()) };
    assert_eq!(again, -1);
    assert_eq!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(libc::ECHILD)
    );
}

#[test]
fn wait_without_children_returns() {
    let _guard = common::serialize();

    // reported on stderr, the process carries on
    blueshmem_wait();
    blueshmem_wait();
}
