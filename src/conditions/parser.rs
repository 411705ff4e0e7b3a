//! rule parser - converts JSON/JSON5 text to a `Rule`
//!
//! supports:
//! - strict JSON or JSON5 (comments, trailing commas, unquoted keys)
//! - structural validation with a path to the offending element
//! - unknown condition types, kept as-is and reported with a suggestion

use std::collections::HashSet;
use std::fmt;

use strsim::levenshtein;
use thiserror::Error;
use tracing::trace;

use super::registry;
use super::types::{ConditionType, Rule};

/// a structural problem found in a parsed rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub message: String,
    pub path: String,
}

impl RuleIssue {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// error type for parsing rules
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid rule syntax: {0}")]
    Syntax(#[from] json5::Error),

    #[error("invalid rule: {}", join_issues(.0))]
    Invalid(Vec<RuleIssue>),
}

impl ParseError {
    /// individual issues, empty for syntax errors
    pub fn issues(&self) -> &[RuleIssue] {
        match self {
            ParseError::Syntax(_) => &[],
            ParseError::Invalid(issues) => issues,
        }
    }
}

fn join_issues(issues: &[RuleIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// parse and validate a rule
pub fn parse_rule(text: &str) -> Result<Rule, ParseError> {
    let rule: Rule = json5::from_str(text)?;

    let issues = validate_rule(&rule);
    if !issues.is_empty() {
        trace!(issues = issues.len(), "rule failed validation");
        return Err(ParseError::Invalid(issues));
    }
    Ok(rule)
}

/// check the id invariants the detector's output relies on
///
/// group ids must be non-empty and unique across the rule, condition ids
/// non-empty and unique within their group
pub fn validate_rule(rule: &Rule) -> Vec<RuleIssue> {
    let mut issues = Vec::new();
    let mut group_ids = HashSet::new();

    let groups = std::iter::once(("triggers".to_string(), &rule.triggers)).chain(
        rule.action_filters
            .iter()
            .enumerate()
            .map(|(i, g)| (format!("actionFilters[{}]", i), g)),
    );

    for (path, group) in groups {
        if group.id.trim().is_empty() {
            issues.push(RuleIssue::new("group id must not be empty", &path));
        } else if !group_ids.insert(group.id.as_str()) {
            issues.push(RuleIssue::new(
                format!("duplicate group id '{}'", group.id),
                &path,
            ));
        }

        let mut condition_ids = HashSet::new();
        for (i, condition) in group.conditions.iter().enumerate() {
            let condition_path = format!("{}.conditions[{}]", path, i);
            if condition.id.trim().is_empty() {
                issues.push(RuleIssue::new(
                    "condition id must not be empty",
                    condition_path,
                ));
            } else if !condition_ids.insert(condition.id.as_str()) {
                issues.push(RuleIssue::new(
                    format!("duplicate condition id '{}'", condition.id),
                    condition_path,
                ));
            }
        }
    }

    issues
}

/// a condition whose type is not in the catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownType {
    pub group_id: String,
    pub condition_id: String,
    pub name: String,
    pub suggestion: Option<&'static str>,
}

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: unknown condition type '{}'",
            self.group_id, self.condition_id, self.name
        )?;
        if let Some(suggestion) = self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

/// list every condition with an unknown type, suggesting the closest known
/// name within `fuzzy_threshold` edits
pub fn unknown_types(rule: &Rule, fuzzy_threshold: usize) -> Vec<UnknownType> {
    rule.groups()
        .flat_map(|g| g.conditions.iter().map(move |c| (g, c)))
        .filter(|(_, condition)| condition.condition_type.is_unknown())
        .map(|(group, condition)| {
            let name = condition.condition_type.as_str();
            UnknownType {
                group_id: group.id.clone(),
                condition_id: condition.id.clone(),
                name: name.to_string(),
                suggestion: suggest_type(name, fuzzy_threshold),
            }
        })
        .collect()
}

/// closest known type name within `fuzzy_threshold` edits
pub fn suggest_type(name: &str, fuzzy_threshold: usize) -> Option<&'static str> {
    let query = name.to_lowercase();

    let mut candidates: Vec<(&'static str, usize)> = ConditionType::KNOWN
        .iter()
        .map(|t| (t.as_str(), levenshtein(&query, t.as_str())))
        .filter(|(_, distance)| *distance <= fuzzy_threshold)
        .collect();

    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    candidates.first().map(|(known, _)| *known)
}

/// conditions placed in the wrong kind of group (a filter among the triggers
/// or the other way round)
pub fn misplaced_conditions(rule: &Rule) -> Vec<RuleIssue> {
    let mut issues = Vec::new();

    for (i, condition) in rule.triggers.conditions.iter().enumerate() {
        if registry::role(&condition.condition_type) == registry::Role::ActionFilter {
            issues.push(RuleIssue::new(
                format!("'{}' is an action filter, not a trigger", condition.condition_type),
                format!("triggers.conditions[{}]", i),
            ));
        }
    }

    for (g, group) in rule.action_filters.iter().enumerate() {
        for (i, condition) in group.conditions.iter().enumerate() {
            if registry::role(&condition.condition_type) == registry::Role::Trigger {
                issues.push(RuleIssue::new(
                    format!("'{}' is a trigger, not an action filter", condition.condition_type),
                    format!("actionFilters[{}].conditions[{}]", g, i),
                ));
            }
        }
    }

    issues
}
