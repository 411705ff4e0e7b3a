//! output formatting utilities for scriptable CLI output
//!
//! uses JSON-RPC 2.0 format for machine-readable output:
//! - success: {"jsonrpc": "2.0", "result": {...}, "id": null}
//! - error: {"jsonrpc": "2.0", "error": {"code": N, "message": "...", "data": {...}}, "id": null}

use std::fmt::Write as _;
use std::io::IsTerminal;

use serde::Serialize;

use crate::conditions::{ConflictResult, FlaggedGroups, Role, Rule, Truth};

/// JSON-RPC version constant
const JSONRPC_VERSION: &str = "2.0";

/// output mode determines how results are formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// human-readable text output
    Text,
    /// machine-readable JSON-RPC 2.0 output
    Json,
    /// no output on success (errors still go to stderr)
    Quiet,
}

impl OutputMode {
    /// determine output mode from CLI flags and environment
    ///
    /// priority: quiet > json > no_json > auto-detect
    pub fn from_flags(json: bool, no_json: bool, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        if json {
            return Self::Json;
        }
        if no_json {
            return Self::Text;
        }
        // auto-detect: JSON when stdout is not a TTY (piped)
        if !std::io::stdout().is_terminal() {
            Self::Json
        } else {
            Self::Text
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self, Self::Quiet)
    }
}

/// JSON-RPC 2.0 success response
#[derive(Serialize)]
pub struct JsonRpcResponse<T: Serialize> {
    pub jsonrpc: &'static str,
    pub result: T,
    /// null for CLI responses (no request id)
    pub id: Option<String>,
}

impl<T: Serialize> JsonRpcResponse<T> {
    pub fn new(result: T) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            result,
            id: None,
        }
    }
}

/// JSON-RPC 2.0 error response
#[derive(Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: &'static str,
    pub error: RpcError,
    pub id: Option<String>,
}

/// JSON-RPC 2.0 error object
#[derive(Serialize)]
pub struct RpcError {
    /// error code (ruleguard exit codes, offset by -32000 for app-specific errors)
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ErrorData>,
}

/// additional error data
#[derive(Serialize)]
pub struct ErrorData {
    pub details: Vec<String>,
}

impl JsonRpcError {
    /// create error with standard JSON-RPC error code range
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self::with_details(code, message, Vec::new())
    }

    pub fn with_details(code: i32, message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            error: RpcError {
                code: to_jsonrpc_code(code),
                message: message.into(),
                data: if details.is_empty() {
                    None
                } else {
                    Some(ErrorData { details })
                },
            },
            id: None,
        }
    }
}

/// convert exit code to JSON-RPC error code
/// JSON-RPC reserves -32000 to -32099 for server/application errors
fn to_jsonrpc_code(code: i32) -> i32 {
    -32000 - code
}

// ============================================================================
// Result data structures
// ============================================================================

/// result data for the check command
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckData<'a> {
    /// file the rule was read from ("-" for stdin)
    pub source: &'a str,
    pub conflict: bool,
    pub conflicting_condition_groups: &'a FlaggedGroups,
    pub conflict_reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<'a> CheckData<'a> {
    pub fn new(source: &'a str, result: &'a ConflictResult, warnings: Vec<String>) -> Self {
        Self {
            source,
            conflict: result.has_conflict(),
            conflicting_condition_groups: &result.conflicting_condition_groups,
            conflict_reason: result.conflict_reason.as_deref(),
            warnings,
        }
    }
}

/// one row of the condition type catalogue
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TypeData {
    pub name: &'static str,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    pub mutually_exclusive: bool,
    pub implies_new_issue: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub incompatible_with: Vec<&'static str>,
    /// outcome against a brand-new issue with a default comparison
    pub new_issue_truth: Truth,
}

// ============================================================================
// Output functions
// ============================================================================

/// print JSON-RPC success response to stdout
pub fn print_json<T: Serialize>(data: &T) {
    let response = JsonRpcResponse::new(data);
    if let Ok(json) = serde_json::to_string(&response) {
        println!("{}", json);
    }
}

/// print JSON-RPC error to stdout
pub fn print_json_error(code: i32, message: &str, details: Vec<String>) {
    let error = JsonRpcError::with_details(code, message, details);
    if let Ok(json) = serde_json::to_string(&error) {
        println!("{}", json);
    }
}

/// human-readable report of a check, listing flagged conditions per group
pub fn render_check_text(source: &str, rule: &Rule, result: &ConflictResult) -> String {
    let mut out = String::new();

    let Some(reason) = result.conflict_reason.as_deref() else {
        let _ = writeln!(out, "✓ No conflicts: {}", source);
        return out;
    };

    let _ = writeln!(out, "✗ {}", reason);
    let _ = writeln!(out, "  in {}", source);

    for group in rule.groups() {
        let Some(ids) = result.flagged(&group.id) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "  {} ({})", group.id, group.logic_type);
        for condition in group.conditions.iter().filter(|c| ids.contains(&c.id)) {
            let _ = writeln!(out, "    - {}", condition);
        }
    }

    out
}

/// aligned table of the type catalogue
pub fn render_types_text(rows: &[TypeData]) -> String {
    let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut out = String::new();

    for row in rows {
        let mut flags = Vec::new();
        if row.mutually_exclusive {
            flags.push("exclusive".to_string());
        }
        if row.implies_new_issue {
            flags.push("new issue".to_string());
        }
        if row.new_issue_truth != Truth::Indeterminate {
            flags.push(format!("{} for new issues", row.new_issue_truth));
        }
        for other in &row.incompatible_with {
            flags.push(format!("incompatible with {}", other));
        }

        let _ = write!(out, "{:<width$}  {:<13}", row.name, row.role.to_string());
        if !flags.is_empty() {
            let _ = write!(out, "  {}", flags.join(", "));
        }
        let _ = writeln!(out);
    }

    out
}
