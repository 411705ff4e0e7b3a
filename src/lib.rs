// library crate for ruleguard
// exposes the detector to other crates and the CLI to auxiliary binaries (e.g., generate-man)

pub mod cli;
pub mod conditions;
pub mod config;

pub use conditions::{
    find_conflicting_conditions, find_conflicting_conditions_with, ConflictResult,
    DetectorOptions,
};
