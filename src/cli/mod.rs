mod commands;
mod error;
pub mod exit_codes;
pub mod output;

pub use commands::{report_error, type_catalogue, Cli, Commands, ConfigCommands};
pub use error::CommandError;

/// run the CLI, returning the process exit code
pub fn run(cli: Cli) -> Result<i32, CommandError> {
    commands::execute(cli)
}
