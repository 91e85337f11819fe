//! State bridge configuration.
//!
//! Loaded from `bridge.toml` through [`ConfigLoader`](crate::config::ConfigLoader).
//! Every field has a default, so an empty file (or no file at all) yields a
//! bridge that reads `/dev/shm/state` every 100 ms.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! log_level = "debug"
//! service_name = "evo-bridge-01"
//!
//! [bridge]
//! region_path = "/dev/shm/state"
//! region_size = 4096
//! poll_interval_ms = 100
//! log_capacity = 3000
//! subscriber_queue = 256
//! listen_addr = "0.0.0.0:8080"
//! ```

use crate::bridge::consts::{
    LISTEN_ADDR, LOG_CAPACITY, POLL_INTERVAL_MS, SUBSCRIBER_QUEUE, SUBSCRIBER_QUEUE_MIN,
};
use crate::config::{ConfigError, SharedConfig};
use crate::shm::consts::{SHM_MAX_SIZE, STATE_REGION_PATH, STATE_REGION_SIZE};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level bridge configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Fields common to all EVO services.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Bridge-specific settings.
    #[serde(default)]
    pub bridge: BridgeSection,
}

impl BridgeConfig {
    /// Validate both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.bridge.validate()
    }
}

/// `[bridge]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BridgeSection {
    /// Path of the shared state region.
    pub region_path: PathBuf,
    /// Region capacity in bytes; one snapshot is this many bytes.
    pub region_size: usize,
    /// Snapshot poll period in milliseconds.
    pub poll_interval_ms: u64,
    /// Characters of control process output retained for replay.
    pub log_capacity: usize,
    /// Per-observer event queue depth.
    pub subscriber_queue: usize,
    /// Observer endpoint listen address.
    pub listen_addr: String,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            region_path: PathBuf::from(STATE_REGION_PATH),
            region_size: STATE_REGION_SIZE,
            poll_interval_ms: POLL_INTERVAL_MS,
            log_capacity: LOG_CAPACITY,
            subscriber_queue: SUBSCRIBER_QUEUE,
            listen_addr: LISTEN_ADDR.to_string(),
        }
    }
}

impl BridgeSection {
    /// Poll period as a [`Duration`].
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Parsed listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr.parse().map_err(|e| {
            ConfigError::ValidationError(format!(
                "listen_addr '{}' is not a socket address: {e}",
                self.listen_addr
            ))
        })
    }

    /// Validate numeric bounds and the listen address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "region_path cannot be empty".to_string(),
            ));
        }
        if self.region_size == 0 || self.region_size > SHM_MAX_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "region_size {} out of range 1..={SHM_MAX_SIZE}",
                self.region_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "log_capacity must be > 0".to_string(),
            ));
        }
        if self.subscriber_queue < SUBSCRIBER_QUEUE_MIN {
            return Err(ConfigError::ValidationError(format!(
                "subscriber_queue must be >= {SUBSCRIBER_QUEUE_MIN}"
            )));
        }
        self.listen_addr()?;
        Ok(())
    }
}
