//! System-wide constants for the EVO workspace.
//!
//! Single source of truth for protocol tokens and default paths.

/// Line that terminates the mapping block printed by the control process.
pub const MAPPING_DELIMITER: &str = "--------";

/// Separator between the three columns of a mapping line.
pub const MAPPING_FIELD_SEPARATOR: char = ':';

/// Separator between key path segments.
pub const KEY_PATH_SEPARATOR: char = '.';

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/evo/bridge.toml";
