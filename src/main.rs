use clap::Parser;
use tracing_subscriber::EnvFilter;

use ruleguard::cli::{self, output::OutputMode, Cli};

fn main() {
    // handle broken pipe gracefully (e.g., when piping to `head` or `jq` that exits early)
    reset_sigpipe();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output_mode = OutputMode::from_flags(cli.json, cli.no_json, cli.quiet);

    let code = match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            cli::report_error(&e, output_mode);
            e.code
        }
    };

    std::process::exit(code);
}

/// logs go to stderr so stdout stays parseable
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// reset SIGPIPE to default behavior (terminate process) instead of panicking
/// this is the standard Unix behavior for CLI tools
fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}
