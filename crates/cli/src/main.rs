// spotcheck CLI - reconcile broadcast airing reports against a contract ledger

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "spotcheck")]
#[command(about = "Check broadcast airing reports against the contracted ledger")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, resolve and reconcile the inputs named in a run file
    #[command(after_help = "\
Examples:
  spotcheck run march.recon.toml
  spotcheck run march.recon.toml --json
  spotcheck run march.recon.toml --output result.json --xlsx result.xlsx
  spotcheck run march.recon.toml --fail-on-missing")]
    Run {
        /// Path to the .recon.toml run file
        config: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write JSON output to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write results as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Write results as a colored XLSX workbook
        #[arg(long, value_name = "PATH")]
        xlsx: Option<PathBuf>,

        /// Exit with code 6 when any airing is NOT_FOUND
        #[arg(long)]
        fail_on_missing: bool,
    },

    /// Validate a run file without reading any inputs
    #[command(after_help = "\
Examples:
  spotcheck validate march.recon.toml")]
    Validate {
        /// Path to the .recon.toml run file
        config: PathBuf,
    },

    /// Parse the report only and print one diagnostic line per row
    #[command(after_help = "\
Examples:
  spotcheck parse march.recon.toml
  spotcheck parse march.recon.toml --json")]
    Parse {
        /// Path to the .recon.toml run file
        config: PathBuf,

        /// Output events and diagnostics as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second init (tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            csv,
            xlsx,
            fail_on_missing,
        } => recon::cmd_run(
            config,
            recon::RunOptions {
                json,
                output,
                csv,
                xlsx,
                fail_on_missing,
            },
        ),
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Parse { config, json } => recon::cmd_parse(config, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "spotcheck",
            "-v",
            "run",
            "march.recon.toml",
            "--json",
            "--xlsx",
            "out.xlsx",
            "--fail-on-missing",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run { config, json, xlsx, fail_on_missing, csv, .. } => {
                assert_eq!(config, PathBuf::from("march.recon.toml"));
                assert!(json);
                assert_eq!(xlsx, Some(PathBuf::from("out.xlsx")));
                assert!(fail_on_missing);
                assert!(csv.is_none());
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn missing_subcommand_is_usage_error() {
        assert!(Cli::try_parse_from(["spotcheck"]).is_err());
    }
}
