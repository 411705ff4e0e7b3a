use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::debug;

use std::io::Read;
use std::path::PathBuf;

use crate::conditions::registry::{self, INCOMPATIBLE_PAIRS};
use crate::conditions::{
    self, find_conflicting_conditions_with, Condition, ConditionType, ConflictResult,
    DetectorOptions, ReasonPrecedence, Role, Rule,
};
use crate::config::{self, Config};

use super::error::CommandError;
use super::exit_codes;
use super::output::{self, CheckData, OutputMode, TypeData};

#[derive(Parser)]
#[command(name = "ruleguard")]
#[command(about = "Detects conflicting conditions in issue-alert automation rules")]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides RULEGUARD_CONFIG env var and default location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (auto-enabled when stdout is piped)
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Force text output even when stdout is piped
    #[arg(long, global = true, conflicts_with = "json")]
    pub no_json: bool,

    /// Suppress all output on success (errors still go to stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace), RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check rule files for conditions that can never be satisfied together
    Check {
        /// Rule files (JSON or JSON5), "-" reads from stdin
        #[arg(default_value = "-")]
        files: Vec<String>,

        /// Reason to report when several kinds of conflict are found (overrides config)
        #[arg(long, value_enum)]
        precedence: Option<PrecedenceArg>,
    },

    /// List known condition types and how they interact
    Types {
        /// Only show types with this role
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Print a shell completion script
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "settings.precedence")
        key: String,
        /// Value to set
        value: String,
    },
    /// Reset configuration to defaults
    Reset,
    /// Show the default configuration
    Default,
    /// Verify configuration file for errors
    Verify,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PrecedenceArg {
    CrossTruthFirst,
    IncompatiblePairFirst,
}

impl From<PrecedenceArg> for ReasonPrecedence {
    fn from(arg: PrecedenceArg) -> Self {
        match arg {
            PrecedenceArg::CrossTruthFirst => ReasonPrecedence::CrossTruthFirst,
            PrecedenceArg::IncompatiblePairFirst => ReasonPrecedence::IncompatiblePairFirst,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    Trigger,
    Filter,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Trigger => Role::Trigger,
            RoleArg::Filter => Role::ActionFilter,
        }
    }
}

/// run the parsed command, returning the process exit code
pub fn execute(cli: Cli) -> Result<i32, CommandError> {
    let config_path = cli.config.as_deref();
    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    match cli.command {
        Commands::Check { files, precedence } => {
            let config = config::load_with_override(config_path)
                .map_err(|e| CommandError::config(format!("{:#}", e)))?;

            let mut options = config.detector_options();
            if let Some(precedence) = precedence {
                options.precedence = precedence.into();
            }

            let mut exit_code = exit_codes::SUCCESS;
            let mut invalid: Option<CommandError> = None;

            for source in &files {
                match check_source(source, &config, &options) {
                    Ok(checked) => {
                        report_check(source, &checked, output_mode);
                        if checked.result.has_conflict() {
                            exit_code = exit_codes::CONFLICT;
                        }
                    }
                    Err(e) if files.len() > 1 => {
                        // keep checking the remaining files, fail at the end
                        report_error(&e, output_mode);
                        invalid = Some(e);
                    }
                    Err(e) => return Err(e),
                }
            }

            match invalid {
                Some(e) => Err(CommandError::new(
                    e.code,
                    "one or more rule files could not be checked",
                )),
                None => Ok(exit_code),
            }
        }

        Commands::Types { role } => {
            let rows = type_catalogue(role.map(Role::from));

            if output_mode.is_json() {
                output::print_json(&rows);
            } else if !output_mode.is_quiet() {
                print!("{}", output::render_types_text(&rows));
            }
            Ok(exit_codes::SUCCESS)
        }

        Commands::Config { command } => {
            execute_config(command, config_path).map_err(|e| match e.code {
                exit_codes::ERROR => CommandError::config(e.message),
                _ => e,
            })?;
            Ok(exit_codes::SUCCESS)
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "ruleguard", &mut std::io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// a rule that went through the detector
struct CheckedRule {
    rule: Rule,
    result: ConflictResult,
    warnings: Vec<String>,
}

fn read_source(source: &str) -> anyhow::Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read rule from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(source).with_context(|| format!("Failed to read rule file: {}", source))
}

fn check_source(
    source: &str,
    config: &Config,
    options: &DetectorOptions,
) -> Result<CheckedRule, CommandError> {
    let text = read_source(source)?;

    let rule = conditions::parse_rule(&text).map_err(|e| {
        let details = e.issues().iter().map(ToString::to_string).collect();
        CommandError::invalid_rule(format!("{}: {}", source, e), details)
    })?;

    let mut warnings: Vec<String> = conditions::unknown_types(&rule, config.settings.fuzzy_threshold)
        .iter()
        .map(ToString::to_string)
        .collect();

    if config.settings.fail_on_unknown_types && !warnings.is_empty() {
        return Err(CommandError::invalid_rule(
            format!("{}: rule uses unknown condition types", source),
            warnings,
        ));
    }

    if config.settings.warn_misplaced {
        warnings.extend(
            conditions::misplaced_conditions(&rule)
                .iter()
                .map(ToString::to_string),
        );
    }

    debug!(
        source,
        action_filters = rule.action_filters.len(),
        precedence = ?options.precedence,
        "checking rule"
    );
    let result = find_conflicting_conditions_with(&rule.triggers, &rule.action_filters, options);
    debug!(source, flagged = result.flagged_count(), "check finished");

    Ok(CheckedRule {
        rule,
        result,
        warnings,
    })
}

fn report_check(source: &str, checked: &CheckedRule, output_mode: OutputMode) {
    match output_mode {
        OutputMode::Json => {
            let data = CheckData::new(source, &checked.result, checked.warnings.clone());
            output::print_json(&data);
        }
        OutputMode::Text => {
            for warning in &checked.warnings {
                eprintln!("warning: {}", warning);
            }
            print!(
                "{}",
                output::render_check_text(source, &checked.rule, &checked.result)
            );
        }
        OutputMode::Quiet => {
            if let Some(reason) = &checked.result.conflict_reason {
                eprintln!("{}: {}", source, reason);
            }
        }
    }
}

/// print an error in the current output mode
pub fn report_error(error: &CommandError, output_mode: OutputMode) {
    if output_mode.is_json() {
        output::print_json_error(error.code, &error.message, error.details.clone());
        return;
    }

    eprintln!("error: {}", error.message);
    for detail in &error.details {
        eprintln!("  - {}", detail);
    }
}

/// catalogue rows for every known type, optionally limited to one role
pub fn type_catalogue(role: Option<Role>) -> Vec<TypeData> {
    ConditionType::KNOWN
        .iter()
        .filter(|t| role.map_or(true, |r| registry::role(t) == r))
        .map(|t| {
            let incompatible_with = INCOMPATIBLE_PAIRS
                .iter()
                .filter_map(|pair| {
                    if &pair.first == t {
                        Some(pair.second.as_str())
                    } else if &pair.second == t {
                        Some(pair.first.as_str())
                    } else {
                        None
                    }
                })
                .collect();

            let probe = Condition::new("", t.clone(), serde_json::Value::Null);

            TypeData {
                name: t.as_str(),
                role: registry::role(t),
                description: registry::trigger_description(t),
                mutually_exclusive: registry::is_mutually_exclusive_trigger(t),
                implies_new_issue: registry::has_truth_table(t),
                incompatible_with,
                new_issue_truth: registry::classify(&ConditionType::FirstSeenEvent, &probe),
            }
        })
        .collect()
}

fn execute_config(
    command: ConfigCommands,
    config_path: Option<&std::path::Path>,
) -> Result<(), CommandError> {
    match command {
        ConfigCommands::Show => {
            let config = config::load_with_override(config_path)?;
            let json =
                serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
            println!("{}", json);
            Ok(())
        }
        ConfigCommands::Path => {
            let path = config::get_config_path_with_override(config_path)?;
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let path = config::get_config_path_with_override(config_path)?;
            let mut config = config::load_with_override(Some(&path))?;
            config::set_value(&mut config, &key, &value)?;
            config::save(&config, &path)?;
            println!("Set {} = {}", key, value);
            Ok(())
        }
        ConfigCommands::Reset => {
            let path = config::get_config_path_with_override(config_path)?;
            config::save(&Config::default(), &path)?;
            println!("Configuration reset to defaults: {}", path.display());
            Ok(())
        }
        ConfigCommands::Default => {
            let json = serde_json::to_string_pretty(&Config::default())
                .context("Failed to serialize config")?;
            println!("{}", json);
            Ok(())
        }
        ConfigCommands::Verify => {
            let path = config::get_config_path_with_override(config_path)?;
            let errors = config::verify(&path)?;

            if errors.is_empty() {
                println!("✓ Configuration is valid: {}", path.display());
                Ok(())
            } else {
                println!(
                    "✗ Configuration has {} error(s): {}",
                    errors.len(),
                    path.display()
                );
                Err(CommandError::with_details(
                    exit_codes::CONFIG_ERROR,
                    "configuration validation failed",
                    errors,
                ))
            }
        }
    }
}
