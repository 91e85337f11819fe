//! Bridge error types.

use crate::mapping::MappingError;
use evo::config::ConfigError;
use evo_shared_memory::ShmError;
use thiserror::Error;

/// Errors surfaced by the bridge and its pumps.
///
/// Everything that reaches `main` through this type terminates the
/// process. Recoverable conditions (missing region, rejected mapping) are
/// turned into the `ERROR` status inside the bridge instead.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// State region failure other than absence.
    #[error("State region error: {0}")]
    Shm(#[from] ShmError),

    /// Pipe or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Mapping block rejected.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Configuration rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inherited file descriptor is not open.
    #[error("File descriptor {fd} is not open: {source}")]
    InvalidDescriptor {
        /// Descriptor number.
        fd: i32,
        /// `fcntl` error.
        source: std::io::Error,
    },

    /// A blocking worker panicked or was cancelled.
    #[error("Worker '{name}' failed: {reason}")]
    Worker {
        /// Worker name.
        name: &'static str,
        /// Join error text.
        reason: String,
    },
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn conversions_keep_source_message() {
        let err: BridgeError = ShmError::NotFound {
            path: PathBuf::from("/dev/shm/state"),
        }
        .into();
        assert!(err.to_string().contains("/dev/shm/state"));

        let err: BridgeError = MappingError::AlreadyComplete.into();
        assert!(matches!(err, BridgeError::Mapping(_)));

        let err: BridgeError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, BridgeError::Io(_)));
    }
}
