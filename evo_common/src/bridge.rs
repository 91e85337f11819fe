//! State bridge constants and configuration.
//!
//! This module contains constants and configuration types for
//! the EVO state bridge.

pub mod config;
pub mod consts;
