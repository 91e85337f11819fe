//! # EVO Shared Memory Access
//!
//! Read-only access to the state region published by the control process.
//!
//! The control process is the single writer: it creates the region, sizes it
//! and updates it in place from its control loop. The bridge is a passive
//! observer that copies the whole region on every poll and never writes
//! back.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │ Control process │    │  State region   │    │   EVO bridge    │
//! │                 ├───►│ /dev/shm/state  ├───►│                 │
//! │  state_t *state │    │   [4096 bytes]  │    │  StateRegion    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use evo_shared_memory::{MemoryPort, StateRegion, ShmError};
//!
//! # fn main() -> Result<(), ShmError> {
//! let mut region = StateRegion::open("/dev/shm/state", 4096)?;
//! let mut snapshot = vec![0u8; region.capacity()];
//! region.read_snapshot(&mut snapshot)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! ```rust,no_run
//! use evo_shared_memory::{ShmError, StateRegion};
//!
//! match StateRegion::open("/dev/shm/state", 4096) {
//!     Ok(region) => { /* use region */ }
//!     Err(ShmError::NotFound { path }) => {
//!         eprintln!("Region '{}' not found - check the control process is running", path.display());
//!     }
//!     Err(e) => eprintln!("Unexpected error: {}", e),
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod port;
pub mod region;

pub use error::{ShmError, ShmResult};
pub use port::MemoryPort;
pub use region::{StateRegion, validate_region_size};
