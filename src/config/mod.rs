mod schema;

pub use schema::{Config, Settings, DEFAULT_FUZZY_THRESHOLD};

use anyhow::{anyhow, Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::conditions::ReasonPrecedence;

const CONFIG_ENV_VAR: &str = "RULEGUARD_CONFIG";

/// resolve the config path: explicit override, then env var, then
/// ~/.ruleguard/config.json
pub fn get_config_path_with_override(override_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
    Ok(home.join(".ruleguard").join("config.json"))
}

/// load config, falling back to defaults when the file does not exist
pub fn load_with_override(override_path: Option<&Path>) -> Result<Config> {
    let path = get_config_path_with_override(override_path)?;

    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    load_from(&path)
}

fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // json5 accepts plain JSON as well as comments and trailing commas
    let config: Config = json5::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

pub fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    Ok(())
}

/// Verify configuration file and return a list of errors
pub fn verify(path: &Path) -> Result<Vec<String>> {
    let mut errors = Vec::new();

    if !path.exists() {
        return Err(anyhow!("config file not found: {}", path.display()));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: Config = match json5::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            return Err(anyhow!("invalid config: {}", e));
        }
    };

    if config.settings.fuzzy_threshold > 10 {
        errors.push(format!(
            "settings.fuzzy_threshold: {} is too large, suggestions would be meaningless (max 10)",
            config.settings.fuzzy_threshold
        ));
    }

    Ok(errors)
}

pub fn set_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["settings", "precedence"] => {
            config.settings.precedence = parse_precedence(value)?;
        }
        ["settings", "fuzzy_threshold"] => {
            config.settings.fuzzy_threshold = value
                .parse()
                .with_context(|| format!("Invalid number: {}", value))?;
        }
        ["settings", "fail_on_unknown_types"] => {
            config.settings.fail_on_unknown_types = parse_bool(value)?;
        }
        ["settings", "warn_misplaced"] => {
            config.settings.warn_misplaced = parse_bool(value)?;
        }
        _ => {
            return Err(anyhow!(
                "Unknown config key: {}. Valid keys: settings.precedence, settings.fuzzy_threshold, settings.fail_on_unknown_types, settings.warn_misplaced",
                key
            ));
        }
    }

    Ok(())
}

fn parse_precedence(value: &str) -> Result<ReasonPrecedence> {
    match value.to_lowercase().replace('-', "_").as_str() {
        "cross_truth_first" => Ok(ReasonPrecedence::CrossTruthFirst),
        "incompatible_pair_first" => Ok(ReasonPrecedence::IncompatiblePairFirst),
        _ => Err(anyhow!(
            "Invalid precedence: {}. Use cross_truth_first or incompatible_pair_first",
            value
        )),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!(
            "Invalid boolean value: {}. Use true/false, yes/no, 1/0, or on/off",
            value
        )),
    }
}
