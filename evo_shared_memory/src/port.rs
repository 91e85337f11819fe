//! Memory port abstraction.
//!
//! The bridge never talks to the region directly: it reads snapshots
//! through a [`MemoryPort`], which lets tests substitute an in-memory
//! region.

use crate::error::ShmResult;

/// Source of raw snapshots of a fixed-size region.
pub trait MemoryPort: Send {
    /// Snapshot size in bytes; every `read_snapshot` fills exactly this many.
    fn capacity(&self) -> usize;

    /// Copy the current region content into `buf`.
    ///
    /// `buf.len()` must equal [`capacity`](MemoryPort::capacity). Fails with
    /// [`ShmError::NotFound`](crate::ShmError::NotFound) when the region has
    /// disappeared, and with any other variant for unrecoverable I/O.
    fn read_snapshot(&mut self, buf: &mut [u8]) -> ShmResult<()>;
}

impl<P: MemoryPort + ?Sized> MemoryPort for Box<P> {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read_snapshot(&mut self, buf: &mut [u8]) -> ShmResult<()> {
        (**self).read_snapshot(buf)
    }
}
