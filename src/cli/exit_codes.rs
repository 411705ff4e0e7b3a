//! exit codes for ruleguard commands
//!
//! these follow Unix conventions where 0 = success and non-zero = error.
//! 2 is left to clap for usage errors

/// command completed successfully, no conflicts found
pub const SUCCESS: i32 = 0;

/// general or unknown error
pub const ERROR: i32 = 1;

/// the rule contains conflicting conditions
pub const CONFLICT: i32 = 3;

/// rule file could not be parsed or failed validation
pub const INVALID_RULE: i32 = 4;

/// configuration file error
pub const CONFIG_ERROR: i32 = 5;
