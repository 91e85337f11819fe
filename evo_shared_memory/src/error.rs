//! Error types for shared memory operations

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while accessing the state region
#[derive(Error, Debug)]
pub enum ShmError {
    /// Region does not exist (control process not running or not started yet)
    #[error("State region not found: {}", path.display())]
    NotFound {
        /// Region path
        path: PathBuf,
    },

    /// Permission denied
    #[error("Permission denied accessing state region: {}", path.display())]
    PermissionDenied {
        /// Region path
        path: PathBuf,
    },

    /// Invalid snapshot capacity
    #[error("Invalid region size: {size} bytes (must be 1..={max})")]
    InvalidSize {
        /// Requested size in bytes
        size: usize,
        /// Largest accepted size
        max: usize,
    },

    /// Region is shorter than the configured snapshot capacity
    #[error("State region {} holds {actual} bytes, {required} required", path.display())]
    RegionTooSmall {
        /// Region path
        path: PathBuf,
        /// Actual region length
        actual: u64,
        /// Configured capacity
        required: usize,
    },

    /// Snapshot buffer does not match the region capacity
    #[error("Snapshot buffer is {actual} bytes, region capacity is {expected}")]
    BufferMismatch {
        /// Region capacity
        expected: usize,
        /// Buffer length handed in
        actual: usize,
    },

    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

impl ShmError {
    /// `true` when the region is absent, the one failure the bridge
    /// survives (it degrades to its error status instead of exiting).
    #[inline]
    pub fn is_resource_absent(&self) -> bool {
        matches!(self, ShmError::NotFound { .. })
    }
}

/// Result type for shared memory operations
pub type ShmResult<T> = Result<T, ShmError>;
