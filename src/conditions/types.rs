//! core types for the condition system

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! condition_types {
    ($($variant:ident => $name:literal,)+) => {
        /// kind of a condition, keyed by its wire name
        ///
        /// unknown names are kept verbatim in `Other` so a rule written for a
        /// newer catalogue still loads and is treated as indeterminate
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum ConditionType {
            $($variant,)+
            Other(String),
        }

        impl ConditionType {
            /// every known condition type, in catalogue order
            pub const KNOWN: &'static [ConditionType] = &[$(ConditionType::$variant,)+];

            /// wire name of the type
            pub fn as_str(&self) -> &str {
                match self {
                    $(ConditionType::$variant => $name,)+
                    ConditionType::Other(name) => name,
                }
            }
        }

        impl FromStr for ConditionType {
            type Err = Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(match s {
                    $($name => ConditionType::$variant,)+
                    other => ConditionType::Other(other.to_string()),
                })
            }
        }
    };
}

condition_types! {
    // triggers
    FirstSeenEvent => "first_seen_event",
    ReappearedEvent => "reappeared_event",
    RegressionEvent => "regression_event",
    IssueResolvedTrigger => "issue_resolved_trigger",
    EveryEvent => "every_event",
    NewHighPriorityIssue => "new_high_priority_issue",
    ExistingHighPriorityIssue => "existing_high_priority_issue",
    IssueResolutionChange => "issue_resolution_change",

    // action filters
    AgeComparison => "age_comparison",
    AssignedTo => "assigned_to",
    EventAttribute => "event_attribute",
    EventSeenCount => "event_seen_count",
    EventFrequencyCount => "event_frequency_count",
    EventFrequencyPercent => "event_frequency_percent",
    EventUniqueUserFrequencyCount => "event_unique_user_frequency_count",
    EventUniqueUserFrequencyPercent => "event_unique_user_frequency_percent",
    PercentSessionsCount => "percent_sessions_count",
    PercentSessionsPercent => "percent_sessions_percent",
    IssueCategory => "issue_category",
    IssueOccurrences => "issue_occurrences",
    IssuePriorityEquals => "issue_priority_equals",
    IssuePriorityGreaterOrEqual => "issue_priority_greater_or_equal",
    IssuePriorityDeescalating => "issue_priority_deescalating",
    LatestAdoptedRelease => "latest_adopted_release",
    LatestRelease => "latest_release",
    Level => "level",
    TaggedEvent => "tagged_event",
}

impl ConditionType {
    /// true for types this build has no catalogue entry for
    pub fn is_unknown(&self) -> bool {
        matches!(self, ConditionType::Other(_))
    }
}

impl From<String> for ConditionType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<ConditionType> for String {
    fn from(t: ConditionType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// boolean combinator applied to the conditions of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicType {
    /// every condition must hold (AND)
    #[serde(rename = "all")]
    All,
    /// any condition holding suffices, evaluation stops at the first (OR)
    #[serde(rename = "any-short", alias = "any")]
    AnyShortCircuit,
    /// every condition must fail to hold (NOR)
    #[serde(rename = "none")]
    None,
}

impl fmt::Display for LogicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicType::All => write!(f, "all"),
            LogicType::AnyShortCircuit => write!(f, "any-short"),
            LogicType::None => write!(f, "none"),
        }
    }
}

/// a single condition inside a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// unique within the owning group
    pub id: String,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// shape depends on the condition type
    #[serde(default)]
    pub comparison: serde_json::Value,
}

impl Condition {
    pub fn new(
        id: impl Into<String>,
        condition_type: ConditionType,
        comparison: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            condition_type,
            comparison,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.condition_type, self.id)?;
        if !self.comparison.is_null() {
            write!(f, " {}", self.comparison)?;
        }
        Ok(())
    }
}

/// a group of conditions joined by one logic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub id: String,
    pub logic_type: LogicType,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new(id: impl Into<String>, logic_type: LogicType, conditions: Vec<Condition>) -> Self {
        Self {
            id: id.into(),
            logic_type,
            conditions,
        }
    }

    /// check if any condition in the group has the given type
    pub fn contains_type(&self, condition_type: &ConditionType) -> bool {
        self.conditions
            .iter()
            .any(|c| &c.condition_type == condition_type)
    }
}

/// an automation rule: a trigger group plus the action filters gating it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub triggers: ConditionGroup,
    #[serde(default)]
    pub action_filters: Vec<ConditionGroup>,
}

impl Rule {
    /// iterate over the trigger group followed by every action filter
    pub fn groups(&self) -> impl Iterator<Item = &ConditionGroup> {
        std::iter::once(&self.triggers).chain(self.action_filters.iter())
    }
}
