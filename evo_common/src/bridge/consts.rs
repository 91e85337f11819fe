//! State bridge constants.
//!
//! Defaults for the polling loop, the log replay buffer and observer
//! fan-out. All of them can be overridden from `bridge.toml`.

/// Canonical bridge service name (used for logging).
pub const BRIDGE_SERVICE_NAME: &str = "bridge";

/// Interval between two snapshot polls, in milliseconds.
pub const POLL_INTERVAL_MS: u64 = 100;

/// Number of characters of control process output kept for late joiners.
pub const LOG_CAPACITY: usize = 3000;

/// Events buffered per observer before further events are dropped for it.
pub const SUBSCRIBER_QUEUE: usize = 256;

/// Smallest accepted per-observer queue: the replay prefix
/// (status, state, log) must always fit.
pub const SUBSCRIBER_QUEUE_MIN: usize = 3;

/// Default listen address for the observer WebSocket endpoint.
pub const LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Chunk size used when reading the control process output.
pub const INPUT_CHUNK_SIZE: usize = 4096;
