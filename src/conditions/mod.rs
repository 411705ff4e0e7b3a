//! condition model and conflict detection for issue-alert rules
//!
//! a rule is a trigger group ("when") plus action-filter groups ("but only
//! if"). each group joins its conditions with one logic type:
//! - all: every condition must hold (AND)
//! - any-short: one holding condition suffices (OR)
//! - none: no condition may hold (NOR)
//!
//! the detector reports condition ids that can never be satisfied together,
//! keyed by group, plus one user-facing reason.

mod detector;
mod parser;
pub mod registry;
mod types;

pub use detector::{
    find_conflicting_conditions, find_conflicting_conditions_with, ConflictResult,
    DetectorOptions, FlaggedGroups, ReasonPrecedence, DUPLICATE_TRIGGERS_REASON,
    EXCLUSIVE_TRIGGERS_REASON,
};
pub use parser::{
    misplaced_conditions, parse_rule, suggest_type, unknown_types, validate_rule, ParseError,
    RuleIssue, UnknownType,
};
pub use registry::{IncompatiblePair, Role, Truth};
pub use types::{Condition, ConditionGroup, ConditionType, LogicType, Rule};
