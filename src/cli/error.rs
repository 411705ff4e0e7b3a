//! command error types

use super::exit_codes;

/// error returned by command execution
#[derive(Debug, Clone)]
pub struct CommandError {
    /// exit code (maps to JSON-RPC error code via -32000 - code)
    pub code: i32,
    /// error message
    pub message: String,
    /// individual problems (e.g., validation issues in a rule file)
    pub details: Vec<String>,
}

impl CommandError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(code: i32, message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    pub fn invalid_rule(message: impl Into<String>, details: Vec<String>) -> Self {
        Self::with_details(exit_codes::INVALID_RULE, message, details)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(exit_codes::CONFIG_ERROR, message)
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::new(exit_codes::ERROR, message)
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

impl From<anyhow::Error> for CommandError {
    fn from(e: anyhow::Error) -> Self {
        // alternate format includes the context chain
        CommandError::general(format!("{:#}", e))
    }
}
