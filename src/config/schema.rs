use serde::{Deserialize, Serialize};

use crate::conditions::{DetectorOptions, ReasonPrecedence};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// detector options derived from the settings
    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            precedence: self.settings.precedence,
        }
    }
}

pub const DEFAULT_FUZZY_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// reason reported when a new-issue conflict and an incompatible pair
    /// are found in the same rule
    #[serde(default)]
    pub precedence: ReasonPrecedence,
    /// max edit distance when suggesting a known name for an unknown type
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: usize,
    /// treat unknown condition types as an invalid rule instead of a warning
    #[serde(default)]
    pub fail_on_unknown_types: bool,
    /// warn about triggers used as filters and filters used as triggers
    #[serde(default = "default_true")]
    pub warn_misplaced: bool,
}

fn default_fuzzy_threshold() -> usize {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            precedence: ReasonPrecedence::default(),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fail_on_unknown_types: false,
            warn_misplaced: true,
        }
    }
}
