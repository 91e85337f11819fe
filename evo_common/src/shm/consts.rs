//! SHM (Shared Memory) constants.
//!
//! The control process creates the state region with `shm_open("/state")`
//! and truncates it to [`STATE_REGION_SIZE`]. On Linux that object is visible
//! as a regular file under `/dev/shm`, which is how the bridge opens it.

use static_assertions::const_assert;

/// Default path of the control process's state region.
pub const STATE_REGION_PATH: &str = "/dev/shm/state";

/// Size of the state region in bytes (one memory page).
pub const STATE_REGION_SIZE: usize = 4096;

/// Largest region the bridge is willing to snapshot.
///
/// Every poll copies the whole region, so this is kept well below what
/// shared memory itself allows.
pub const SHM_MAX_SIZE: usize = 16 * 1024 * 1024; // 16MB

const_assert!(STATE_REGION_SIZE > 0);
const_assert!(STATE_REGION_SIZE <= SHM_MAX_SIZE);
