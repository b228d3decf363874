#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "civic: inspect document request snapshots",
    long_about = None
)]
struct Cli {
    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Project directory holding `.civic/config.toml` (defaults to cwd).
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Show the reconstructed timeline of one request",
        after_help = "EXAMPLES:\n    # Timeline of request 42\n    civic timeline snapshot.json 42\n\n    # Emit machine-readable output\n    civic timeline snapshot.json 42 --json"
    )]
    Timeline(cmd::timeline::TimelineArgs),

    #[command(
        about = "Group requests by document type",
        after_help = "EXAMPLES:\n    # All groups in a snapshot\n    civic groups snapshot.json\n\n    # One resident's Barangay Clearance history\n    civic groups snapshot.json --resident 7 --type \"Barangay Clearance\" --history"
    )]
    Groups(cmd::groups::GroupsArgs),

    #[command(
        about = "Query an administrative list",
        after_help = "EXAMPLES:\n    # Pending requests, newest first\n    civic list requests snapshot.json --filter status=pending\n\n    # Senior residents of Purok 2, second page\n    civic list residents snapshot.json --filter age_bracket=senior --filter purok=\"Purok 2\" --page 2"
    )]
    List(cmd::list::ListArgs),

    #[command(
        about = "Describe a status string",
        after_help = "EXAMPLES:\n    civic status claimed\n    civic status \"for review\" --json"
    )]
    Status(cmd::status::StatusArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CIVIC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "civic_core=debug,civic=debug,info"
        } else {
            "civic_core=warn,civic=info,warn"
        })
    });

    let format = env::var("CIVIC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, output: OutputMode) -> anyhow::Result<()> {
    let project_root = match &cli.project {
        Some(dir) => dir.clone(),
        None => env::current_dir()?,
    };
    let config = civic_core::config::resolve_config(&project_root)?;
    debug!(root = %project_root.display(), "resolved configuration");

    match &cli.command {
        Commands::Timeline(args) => cmd::timeline::run_timeline(args, output, &config),
        Commands::Groups(args) => cmd::groups::run_groups(args, output, &config),
        Commands::List(args) => cmd::list::run_list(args, output, &config),
        Commands::Status(args) => cmd::status::run_status(args, output),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let output = cli.output_mode();

    match run(&cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Err(render_err) = output::render_error(output, &CliError::from_anyhow(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::parse_from(["civic", "timeline", "snap.json", "3", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Timeline(_)));
    }

    #[test]
    fn format_flag_parses() {
        let cli = Cli::parse_from(["civic", "--format", "text", "status", "ready"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }
}
