//! static condition catalogue
//!
//! all domain knowledge the detector relies on lives here as plain lookup
//! functions keyed by `ConditionType`:
//! - which triggers describe a brand-new issue and what every other condition
//!   evaluates to against such an issue
//! - which triggers are mutually exclusive lifecycle events
//! - which condition pairs contradict each other inside one group
//!
//! adding a condition type only ever means adding match arms here

use std::fmt;

use serde::Serialize;
use serde_json::Value as JsonValue;

use super::types::{Condition, ConditionType};

/// statically known outcome of a condition under a trigger's implied state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Truth {
    AlwaysTrue,
    AlwaysFalse,
    Indeterminate,
}

impl fmt::Display for Truth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truth::AlwaysTrue => write!(f, "always true"),
            Truth::AlwaysFalse => write!(f, "always false"),
            Truth::Indeterminate => write!(f, "indeterminate"),
        }
    }
}

/// where a condition type is meant to be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Trigger,
    ActionFilter,
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Trigger => write!(f, "trigger"),
            Role::ActionFilter => write!(f, "action filter"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}

pub fn role(condition_type: &ConditionType) -> Role {
    use ConditionType::*;

    match condition_type {
        FirstSeenEvent
        | ReappearedEvent
        | RegressionEvent
        | IssueResolvedTrigger
        | EveryEvent
        | NewHighPriorityIssue
        | ExistingHighPriorityIssue
        | IssueResolutionChange => Role::Trigger,
        Other(_) => Role::Unknown,
        _ => Role::ActionFilter,
    }
}

/// natural-language description of a trigger event
pub fn trigger_description(condition_type: &ConditionType) -> Option<&'static str> {
    use ConditionType::*;

    match condition_type {
        FirstSeenEvent => Some("A new issue is created."),
        ReappearedEvent => Some("The issue changes state from archived to escalating."),
        RegressionEvent => Some("The issue changes state from resolved to unresolved."),
        IssueResolvedTrigger => Some("The issue is resolved."),
        EveryEvent => Some("An event is captured."),
        NewHighPriorityIssue => Some("Sentry marks a new issue as high priority."),
        ExistingHighPriorityIssue => Some("Sentry marks an existing issue as high priority."),
        IssueResolutionChange => Some("The issue's resolution status changes."),
        _ => None,
    }
}

/// triggers that only fire for a freshly created issue carry a truth table
pub fn has_truth_table(trigger: &ConditionType) -> bool {
    matches!(
        trigger,
        ConditionType::FirstSeenEvent | ConditionType::NewHighPriorityIssue
    )
}

/// lifecycle transitions of which at most one happens for a given event
pub fn is_mutually_exclusive_trigger(condition_type: &ConditionType) -> bool {
    matches!(
        condition_type,
        ConditionType::FirstSeenEvent
            | ConditionType::ReappearedEvent
            | ConditionType::RegressionEvent
            | ConditionType::IssueResolvedTrigger
    )
}

/// classify `condition` against the issue state implied by `trigger`
///
/// triggers without a truth table imply nothing, so every condition is
/// indeterminate under them
pub fn classify(trigger: &ConditionType, condition: &Condition) -> Truth {
    if !has_truth_table(trigger) {
        return Truth::Indeterminate;
    }
    classify_for_new_issue(condition)
}

/// a new issue has exactly one occurrence, zero age and no aggregated
/// frequency data yet
fn classify_for_new_issue(condition: &Condition) -> Truth {
    use ConditionType::*;

    match &condition.condition_type {
        IssueOccurrences => match comparison_number(&condition.comparison, "value") {
            Some(n) if n <= 1.0 => Truth::AlwaysTrue,
            Some(_) => Truth::AlwaysFalse,
            None => Truth::Indeterminate,
        },
        AgeComparison => {
            let direction = condition
                .comparison
                .get("comparison_type")
                .and_then(JsonValue::as_str);
            match direction {
                Some("older") => Truth::AlwaysFalse,
                Some("newer") => match comparison_number(&condition.comparison, "value") {
                    Some(n) if n > 0.0 => Truth::AlwaysTrue,
                    Some(_) => Truth::AlwaysFalse,
                    None => Truth::Indeterminate,
                },
                _ => Truth::Indeterminate,
            }
        }
        // frequency buckets are only filled once the first event is processed
        EventFrequencyCount
        | EventFrequencyPercent
        | EventUniqueUserFrequencyCount
        | EventUniqueUserFrequencyPercent
        | PercentSessionsCount
        | PercentSessionsPercent => Truth::AlwaysFalse,
        _ => Truth::Indeterminate,
    }
}

/// read a numeric field from a comparison object, accepting numeric strings
///
/// "NaN" and "inf" parse as floats but compare as neither side of a
/// threshold, so non-finite values count as missing
fn comparison_number(comparison: &JsonValue, key: &str) -> Option<f64> {
    let n = match comparison.get(key)? {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// two condition types that can never hold together inside one group
#[derive(Debug, Clone)]
pub struct IncompatiblePair {
    pub first: ConditionType,
    pub second: ConditionType,
    pub reason: &'static str,
}

impl IncompatiblePair {
    pub fn involves(&self, condition_type: &ConditionType) -> bool {
        &self.first == condition_type || &self.second == condition_type
    }
}

/// checked in order, the first pair found supplies the reason
pub static INCOMPATIBLE_PAIRS: &[IncompatiblePair] = &[IncompatiblePair {
    first: ConditionType::IssuePriorityGreaterOrEqual,
    second: ConditionType::IssuePriorityDeescalating,
    reason: "The issue priority conditions highlighted in red are in conflict.",
}];
