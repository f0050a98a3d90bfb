use crate::error::Result;
use crate::low_level;

use std::ptr::NonNull;

/// A fixed length run of `u32`s in memory shared with the processes
/// duplicated from this one.
///
/// Reads and writes always start at element 0. Nothing here locks the
/// memory: if another process may be writing while this one reads (or the
/// other way round) the contents are unspecified. Pair the buffer with a
/// [Flag][crate::Flag], or use a [Channel][crate::Channel], to take turns.
///
/// A `SharedBuffer` is not `Clone`, so inside one process there is only ever
/// one handle to write through. The memory lives until the process exits.
///
/// # Example
///```
/// use blueshmem_rs::SharedBuffer;
///
/// let mut buffer = SharedBuffer::new(4);
/// buffer.write(&[10, 20, 30, 40]);
///
/// let mut out = [0; 4];
/// buffer.read(&mut out);
/// assert_eq!(out, [10, 20, 30, 40]);
///```
#[derive(Debug)]
pub struct SharedBuffer {
    addr: NonNull<u32>,
    len: usize,
}

unsafe impl Send for SharedBuffer {}

impl SharedBuffer {
    /// Maps a zero filled buffer of `len` elements.
    ///
    /// If the memory cannot be mapped a diagnostic is printed and the
    /// process exits; see [SharedBuffer::try_new].
    pub fn new(len: usize) -> SharedBuffer {
        SharedBuffer::try_new(len).unwrap_or_else(|err| err.exit())
    }

    /// Maps a zero filled buffer of `len` elements, handing back the failure
    pub fn try_new(len: usize) -> Result<SharedBuffer> {
        let addr = low_level::map_buffer(len)?;
        log::debug!("shared buffer of {} elements at {:p}", len, addr);
        Ok(SharedBuffer { addr, len })
    }

    /// The number of elements the buffer was allocated with
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies `data` to the start of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data` is longer than the buffer.
    pub fn write(&mut self, data: &[u32]) {
        if data.len() > self.len {
            panic!(
                "out of bounds error on shared buffer: writing {} elements into {}",
                data.len(),
                self.len
            );
        }
        unsafe { low_level::copy_in(self.addr, data) }
    }

    /// Fills `out` from the start of the buffer.
    ///
    /// # Panics
    ///
    /// Panics if `out` is longer than the buffer.
    pub fn read(&self, out: &mut [u32]) {
        if out.len() > self.len {
            panic!(
                "out of bounds error on shared buffer: reading {} elements from {}",
                out.len(),
                self.len
            );
        }
        unsafe { low_level::copy_out(out, self.addr) }
    }

    /// Returns a copy of the whole buffer
    pub fn to_vec(&self) -> Vec<u32> {
        let mut out = vec![0; self.len];
        self.read(&mut out);
        out
    }

    /// Copies `data` to the start of the buffer without checking its length,
    /// exactly like `blueshmem_write`.
    ///
    /// # Safety
    ///
    /// The memory behind the buffer must hold at least `data.len()` elements.
    /// This is only ever in doubt for a buffer made with
    /// [SharedBuffer::from_raw] with a made-up length.
    pub unsafe fn write_unchecked(&mut self, data: &[u32]) {
        low_level::copy_in(self.addr, data)
    }

    /// Fills `out` from the start of the buffer without checking its length,
    /// exactly like `blueshmem_read`.
    ///
    /// # Safety
    ///
    /// The memory behind the buffer must hold at least `out.len()` elements.
    pub unsafe fn read_unchecked(&self, out: &mut [u32]) {
        low_level::copy_out(out, self.addr)
    }

    /// The buffer's address, as used by `blueshmem_read` / `blueshmem_write`
    pub fn as_raw(&self) -> u64 {
        self.addr.as_ptr() as u64
    }

    /// Wraps a handle obtained from the C interface.
    ///
    /// Returns `None` for a null handle, which is what `blueshmem_allocate`
    /// hands back when mapping fails.
    ///
    /// # Safety
    ///
    /// `raw` must come from `blueshmem_allocate` (or [SharedBuffer::as_raw])
    /// for at least `len` elements, and no other `SharedBuffer` in this
    /// process may refer to the same memory.
    pub unsafe fn from_raw(raw: u64, len: usize) -> Option<SharedBuffer> {
        NonNull::new(raw as usize as *mut u32).map(|addr| SharedBuffer { addr, len })
    }
}
