//! EVO Common Library
//!
//! This crate provides shared constants and configuration loading utilities
//! for the EVO state bridge workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Workspace-wide constants (mapping protocol, default paths)
//! - [`shm`] - Shared memory region constants
//! - [`bridge`] - State bridge constants and configuration
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! evo = { package = "evo_common", path = "../evo_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use evo_common::shm::consts::*;
//! use evo_common::config::{ConfigLoader, SharedConfig};
//! ```

pub mod bridge;
pub mod config;
pub mod consts;
pub mod prelude;
pub mod shm;
