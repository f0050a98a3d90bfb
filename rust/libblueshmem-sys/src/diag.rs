//! Diagnostics for failed OS calls.
//!
//! Messages follow the `perror` shape, `<context>: <os error>`, on standard
//! error. Two policies sit on top: [fatal] terminates the process with exit
//! status [FATAL_EXIT_CODE], [report] lets the caller continue.

use std::fmt::Display;
use std::io::{self, Write};

pub const FORK_FAILED: &str = "Fork failed";
pub const WAIT_FAILED: &str = "Wait failed";
pub const MAP_FAILED: &str = "Failed to map shared memory";
pub const SEM_INIT_FAILED: &str = "Failed to initialise semaphore";
pub const SEM_VALUE_FAILED: &str = "Failed to get semaphore value";

/// Exit status of a process brought down by [fatal]
pub const FATAL_EXIT_CODE: i32 = 1;

/// Formats a diagnostic line
pub fn message(context: &str, err: &impl Display) -> String {
    format!("{}: {}", context, err)
}

// Straight to fd 2, the host may not be a Rust program
fn emit(context: &str, err: &io::Error) {
    let _ = writeln!(io::stderr().lock(), "{}", message(context, err));
}

/// Emits a diagnostic and returns
pub fn report(context: &str, err: &io::Error) {
    emit(context, err);
    log::debug!("continuing after {:?}", err.kind());
}

/// Emits a diagnostic and terminates the calling process.
///
/// No destructors run and nothing acquired so far is released; the OS
/// reclaims the mappings when the process goes away.
pub fn fatal(context: &str, err: &io::Error) -> ! {
    emit(context, err);
    log::debug!("exiting with status {}", FATAL_EXIT_CODE);
    std::process::exit(FATAL_EXIT_CODE)
}
