//! conflict detector
//!
//! inspects a rule's trigger group and action filters and reports the
//! condition ids that can never be satisfied together. runs four checks in
//! order:
//! 1. duplicate triggers (stops here if found)
//! 2. mutually exclusive triggers under "all" logic (stops here if found)
//! 3. action filters whose outcome is fixed by a new-issue trigger
//! 4. incompatible condition pairs inside any group
//!
//! checks 3 and 4 both run and their flagged ids are merged per group.
//! the detector is pure: no I/O, no state kept between calls

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::registry::{self, Truth, INCOMPATIBLE_PAIRS};
use super::types::{Condition, ConditionGroup, ConditionType, LogicType};

pub const DUPLICATE_TRIGGERS_REASON: &str = "Delete duplicate triggers to continue.";

pub const EXCLUSIVE_TRIGGERS_REASON: &str =
    "The triggers highlighted in red are mutually exclusive and cannot be used together with \"All\" logic.";

/// group id -> ids of flagged conditions in that group
pub type FlaggedGroups = BTreeMap<String, BTreeSet<String>>;

/// outcome of a detector run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    pub conflicting_condition_groups: FlaggedGroups,
    pub conflict_reason: Option<String>,
}

impl ConflictResult {
    /// result with nothing flagged
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_conflict(&self) -> bool {
        !self.conflicting_condition_groups.is_empty()
    }

    /// flagged condition ids of one group, if any
    pub fn flagged(&self, group_id: &str) -> Option<&BTreeSet<String>> {
        self.conflicting_condition_groups.get(group_id)
    }

    pub fn is_flagged(&self, group_id: &str, condition_id: &str) -> bool {
        self.flagged(group_id)
            .is_some_and(|ids| ids.contains(condition_id))
    }

    /// number of flagged conditions across all groups
    pub fn flagged_count(&self) -> usize {
        self.conflicting_condition_groups
            .values()
            .map(BTreeSet::len)
            .sum()
    }
}

/// which reason wins when checks 3 and 4 both fire in the same call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonPrecedence {
    #[default]
    CrossTruthFirst,
    IncompatiblePairFirst,
}

/// tunables for a detector run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorOptions {
    pub precedence: ReasonPrecedence,
}

/// flagged ids and reason produced by a single check
#[derive(Debug, Default)]
struct Findings {
    groups: FlaggedGroups,
    reason: Option<String>,
}

impl Findings {
    fn flag(&mut self, group_id: &str, condition_id: &str) {
        self.groups
            .entry(group_id.to_string())
            .or_default()
            .insert(condition_id.to_string());
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn into_result(self) -> ConflictResult {
        if self.groups.is_empty() {
            return ConflictResult::none();
        }
        ConflictResult {
            conflicting_condition_groups: self.groups,
            conflict_reason: self.reason,
        }
    }
}

/// find conflicting conditions with the default options
pub fn find_conflicting_conditions(
    triggers: &ConditionGroup,
    action_filters: &[ConditionGroup],
) -> ConflictResult {
    find_conflicting_conditions_with(triggers, action_filters, &DetectorOptions::default())
}

/// find conflicting conditions in a trigger group and its action filters
///
/// group ids must be unique across `triggers` and `action_filters`, flagged
/// ids are keyed by group id only. `parse_rule` rejects rules that reuse one
pub fn find_conflicting_conditions_with(
    triggers: &ConditionGroup,
    action_filters: &[ConditionGroup],
    options: &DetectorOptions,
) -> ConflictResult {
    let duplicates = check_duplicate_triggers(triggers);
    if !duplicates.is_empty() {
        return duplicates.into_result();
    }

    let exclusive = check_exclusive_triggers(triggers);
    if !exclusive.is_empty() {
        return exclusive.into_result();
    }

    let cross_truth = check_trigger_filter_truth(triggers, action_filters);
    let pairs = check_incompatible_pairs(std::iter::once(triggers).chain(action_filters));

    merge(cross_truth, pairs, options.precedence)
}

fn check_duplicate_triggers(triggers: &ConditionGroup) -> Findings {
    let mut counts: BTreeMap<&ConditionType, usize> = BTreeMap::new();
    for condition in &triggers.conditions {
        *counts.entry(&condition.condition_type).or_default() += 1;
    }

    let mut findings = Findings::default();
    for condition in &triggers.conditions {
        if counts[&condition.condition_type] > 1 {
            findings.flag(&triggers.id, &condition.id);
        }
    }

    if !findings.is_empty() {
        debug!(group = %triggers.id, "duplicate trigger types");
        findings.reason = Some(DUPLICATE_TRIGGERS_REASON.to_string());
    }
    findings
}

fn check_exclusive_triggers(triggers: &ConditionGroup) -> Findings {
    let mut findings = Findings::default();
    if triggers.logic_type != LogicType::All {
        return findings;
    }

    let exclusive: BTreeSet<&ConditionType> = triggers
        .conditions
        .iter()
        .map(|c| &c.condition_type)
        .filter(|t| registry::is_mutually_exclusive_trigger(t))
        .collect();

    if exclusive.len() > 1 {
        debug!(group = %triggers.id, count = exclusive.len(), "mutually exclusive triggers under all");
        for condition in &triggers.conditions {
            findings.flag(&triggers.id, &condition.id);
        }
        findings.reason = Some(EXCLUSIVE_TRIGGERS_REASON.to_string());
    }
    findings
}

/// trigger conditions whose implied issue state can be assumed when the
/// action filters run
fn implying_triggers(triggers: &ConditionGroup) -> Vec<&Condition> {
    let with_table = |c: &&Condition| registry::has_truth_table(&c.condition_type);

    match triggers.logic_type {
        LogicType::All => triggers.conditions.iter().filter(with_table).collect(),
        // any other trigger firing would escape the implied state
        LogicType::AnyShortCircuit => {
            if !triggers.conditions.is_empty() && triggers.conditions.iter().all(|c| with_table(&c))
            {
                triggers.conditions.iter().collect()
            } else {
                Vec::new()
            }
        }
        LogicType::None => Vec::new(),
    }
}

/// ids of the conditions in `group` that make it unsatisfiable under `trigger`
fn unsatisfiable_conditions<'a>(trigger: &ConditionType, group: &'a ConditionGroup) -> Vec<&'a str> {
    let truths: Vec<(&Condition, Truth)> = group
        .conditions
        .iter()
        .map(|c| (c, registry::classify(trigger, c)))
        .collect();

    let with = |wanted: Truth| -> Vec<&'a str> {
        truths
            .iter()
            .filter(|(_, truth)| *truth == wanted)
            .map(|&(c, _)| c.id.as_str())
            .collect()
    };

    match group.logic_type {
        LogicType::All => with(Truth::AlwaysFalse),
        LogicType::AnyShortCircuit => {
            let all_false =
                !truths.is_empty() && truths.iter().all(|(_, t)| *t == Truth::AlwaysFalse);
            if all_false {
                with(Truth::AlwaysFalse)
            } else {
                Vec::new()
            }
        }
        LogicType::None => with(Truth::AlwaysTrue),
    }
}

fn check_trigger_filter_truth(
    triggers: &ConditionGroup,
    action_filters: &[ConditionGroup],
) -> Findings {
    let mut findings = Findings::default();
    let implying = implying_triggers(triggers);
    if implying.is_empty() {
        return findings;
    }

    for group in action_filters {
        for trigger in &implying {
            let ids = unsatisfiable_conditions(&trigger.condition_type, group);
            if ids.is_empty() {
                continue;
            }

            debug!(
                group = %group.id,
                trigger = %trigger.condition_type,
                flagged = ids.len(),
                "action filter conflicts with trigger"
            );
            for id in ids {
                findings.flag(&group.id, id);
            }
            findings.flag(&triggers.id, &trigger.id);

            if findings.reason.is_none() {
                let description = registry::trigger_description(&trigger.condition_type)
                    .unwrap_or_else(|| trigger.condition_type.as_str());
                findings.reason = Some(format!(
                    "The conditions highlighted in red are in conflict with \"{}\"",
                    description
                ));
            }
        }
    }
    findings
}

fn check_incompatible_pairs<'a>(groups: impl Iterator<Item = &'a ConditionGroup>) -> Findings {
    let mut findings = Findings::default();

    for group in groups {
        for pair in INCOMPATIBLE_PAIRS {
            if !group.contains_type(&pair.first) || !group.contains_type(&pair.second) {
                continue;
            }

            debug!(group = %group.id, first = %pair.first, second = %pair.second, "incompatible pair");
            for condition in &group.conditions {
                if pair.involves(&condition.condition_type) {
                    findings.flag(&group.id, &condition.id);
                }
            }
            if findings.reason.is_none() {
                findings.reason = Some(pair.reason.to_string());
            }
        }
    }
    findings
}

fn merge(cross_truth: Findings, pairs: Findings, precedence: ReasonPrecedence) -> ConflictResult {
    let (preferred, fallback) = match precedence {
        ReasonPrecedence::CrossTruthFirst => (&cross_truth, &pairs),
        ReasonPrecedence::IncompatiblePairFirst => (&pairs, &cross_truth),
    };
    let reason = if !preferred.is_empty() {
        preferred.reason.clone()
    } else {
        fallback.reason.clone()
    };

    let mut merged = Findings {
        groups: cross_truth.groups,
        reason,
    };
    for (group_id, ids) in pairs.groups {
        merged.groups.entry(group_id).or_default().extend(ids);
    }
    merged.into_result()
}
