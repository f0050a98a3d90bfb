use crate::buffer::SharedBuffer;
use crate::error::Result;
use crate::flag::{Flag, FlagBuilder};

/// A single slot channel between one producing and one consuming process.
///
/// The slot is a [SharedBuffer] guarded by two flags: `empty` starts at 1
/// and is held by whoever may write, `full` starts at 0 and is raised once
/// data is waiting. Sends and receives therefore strictly alternate, and a
/// sender blocks until the previous message has been read.
///
/// Allocate the channel before [duplicate][crate::duplicate] so both
/// processes share it. There must be exactly one sender and one receiver.
///
/// # Example
///```no_run
/// use blueshmem_rs::{duplicate, join_any, Channel, Role};
///
/// let mut channel = Channel::new(4);
/// match duplicate() {
///     Role::Child => {
///         let mut data = [0; 4];
///         channel.recv(&mut data);
///         assert_eq!(data, [10, 20, 30, 40]);
///         std::process::exit(0);
///     }
///     Role::Parent(_) => {
///         channel.send(&[10, 20, 30, 40]);
///         join_any();
///     }
/// }
///```
#[derive(Debug)]
pub struct Channel {
    buffer: SharedBuffer,
    empty: Flag,
    full: Flag,
}

impl Channel {
    /// Allocates a channel carrying up to `len` elements per message,
    /// exiting the process on failure
    pub fn new(len: usize) -> Channel {
        Channel::try_new(len).unwrap_or_else(|err| err.exit())
    }

    /// Allocates a channel, handing back the failure
    pub fn try_new(len: usize) -> Result<Channel> {
        Ok(Channel {
            buffer: SharedBuffer::try_new(len)?,
            empty: FlagBuilder::new().initial(1).try_allocate()?,
            full: FlagBuilder::new().initial(0).try_allocate()?,
        })
    }

    /// The largest message the channel carries
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Waits for the slot to be free, fills it with `data` and signals the
    /// receiver.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than the channel, before touching either
    /// flag.
    pub fn send(&mut self, data: &[u32]) {
        assert!(
            data.len() <= self.buffer.len(),
            "out of bounds error on channel: sending {} elements into {}",
            data.len(),
            self.buffer.len()
        );
        self.empty.decrement_blocking();
        self.buffer.write(data);
        self.full.increment();
    }

    /// Waits for a message, copies it into `out` and frees the slot for the
    /// sender.
    ///
    /// # Panics
    ///
    /// Panics if `out` is longer than the channel, before touching either
    /// flag.
    pub fn recv(&mut self, out: &mut [u32]) {
        assert!(
            out.len() <= self.buffer.len(),
            "out of bounds error on channel: receiving {} elements from {}",
            out.len(),
            self.buffer.len()
        );
        self.full.decrement_blocking();
        self.buffer.read(out);
        self.empty.increment();
    }

    /// `true` when a message has been sent and not yet received
    pub fn is_pending(&self) -> bool {
        self.full.value() > 0
    }
}
