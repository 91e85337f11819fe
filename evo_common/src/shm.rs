//! Shared memory subsystem.
//!
//! - `consts`: region location, size limits.

pub mod consts;
