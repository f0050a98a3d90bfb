//! Safe Rust bindings for blueshmem.
//!
//! blueshmem gives a program three things: a way to duplicate itself
//! ([duplicate]) and wait for the copy to finish ([join_any]), counting
//! [Flag]s that both copies can raise and wait on, and [SharedBuffer]s of
//! `u32`s that both copies can read and write. Flags and buffers must be
//! allocated *before* duplicating; they are never freed.
//!
//! The only ordering between the processes is what the flags provide. The
//! supported pattern is strict alternation: the producer writes and then
//! increments, the consumer decrements (waiting if need be) and then reads.
//! [Channel] packages that pattern for repeated messages.
//!
//! Failing to create a process or a flag, or to read a flag, prints a
//! diagnostic and exits the process. Each of these has a `try_*` twin
//! returning [Error] instead.
//!
//! # Example
//!```no_run
//! use blueshmem_rs::{duplicate, join_any, Flag, Role, SharedBuffer};
//!
//! let flag = Flag::new();
//! let mut buffer = SharedBuffer::new(4);
//!
//! // hold the only token so the child waits for the data
//! flag.decrement_blocking();
//!
//! match duplicate() {
//!     Role::Child => {
//!         flag.decrement_blocking();
//!         assert_eq!(buffer.to_vec(), [10, 20, 30, 40]);
//!         std::process::exit(0);
//!     }
//!     Role::Parent(_) => {
//!         buffer.write(&[10, 20, 30, 40]);
//!         flag.increment();
//!         join_any();
//!     }
//! }
//!```

mod buffer;
mod channel;
mod error;
mod flag;
mod low_level;
mod process;

pub use buffer::SharedBuffer;
pub use channel::Channel;
pub use error::{Error, Result};
pub use flag::{Flag, FlagBuilder};
pub use process::{duplicate, join_any, try_duplicate, try_join_any, Pid, Role};
