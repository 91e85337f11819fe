//! State region reader.
//!
//! The control process owns the region: it creates it with `shm_open`,
//! sizes it with `ftruncate` and rewrites it in place. The bridge opens the
//! backing file and takes positioned reads of the whole region.

use crate::error::{ShmError, ShmResult};
use crate::port::MemoryPort;
use evo::shm::consts::SHM_MAX_SIZE;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Handle to the control process's state region.
#[derive(Debug)]
pub struct StateRegion {
    path: PathBuf,
    file: File,
    capacity: usize,
}

impl StateRegion {
    /// Open an existing region.
    ///
    /// The region is opened read-write to match the control process's own
    /// mapping mode, but the bridge only ever reads it.
    ///
    /// # Errors
    /// - [`ShmError::InvalidSize`] if `capacity` is zero or above `SHM_MAX_SIZE`
    /// - [`ShmError::NotFound`] if the region does not exist
    /// - [`ShmError::PermissionDenied`] if it cannot be opened
    /// - [`ShmError::RegionTooSmall`] if it is shorter than `capacity`
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> ShmResult<Self> {
        validate_region_size(capacity)?;
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| classify_io(&path, e))?;

        let actual = file.metadata()?.len();
        if actual < capacity as u64 {
            return Err(ShmError::RegionTooSmall {
                path,
                actual,
                required: capacity,
            });
        }

        info!("Attached state region {} ({} bytes)", path.display(), capacity);
        Ok(Self {
            path,
            file,
            capacity,
        })
    }

    /// Region path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MemoryPort for StateRegion {
    fn capacity(&self) -> usize {
        self.capacity
    }

    fn read_snapshot(&mut self, buf: &mut [u8]) -> ShmResult<()> {
        if buf.len() != self.capacity {
            return Err(ShmError::BufferMismatch {
                expected: self.capacity,
                actual: buf.len(),
            });
        }

        self.file.read_exact_at(buf, 0).map_err(|e| {
            debug!("Snapshot read from {} failed: {}", self.path.display(), e);
            classify_io(&self.path, e)
        })
    }
}

/// Validate snapshot capacity constraints
pub fn validate_region_size(size: usize) -> ShmResult<()> {
    if size == 0 || size > SHM_MAX_SIZE {
        return Err(ShmError::InvalidSize {
            size,
            max: SHM_MAX_SIZE,
        });
    }
    Ok(())
}

fn classify_io(path: &Path, err: std::io::Error) -> ShmError {
    match err.kind() {
        ErrorKind::NotFound => ShmError::NotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => ShmError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ShmError::Io { source: err },
    }
}
