//! Binary entry point for the tugstyle CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Report what would be renamed (unified diff plus summary)
//! tugstyle check
//!
//! # Apply one rule and print the JSON response
//! tugstyle fix --rule method-naming --format json
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use tugstyle::cli::{run_check, run_fix};
use tugstyle::output::{emit_response, render_text, ErrorResponse, StyleResponse};
use tugstyle::{CancellationToken, OutputErrorCode, RuleId, StyleError};

/// Enforce naming conventions by renaming symbols across a workspace.
#[derive(Parser, Debug)]
#[command(name = "tugstyle", version, about = "Naming-convention enforcement through verified renames")]
struct Cli {
    /// Workspace root directory (default: current directory).
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    /// Rule to run; repeat for several (default: rules enabled in tugstyle.toml).
    #[arg(long = "rule", global = true, value_parser = parse_rule)]
    rules: Vec<RuleId>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report the renames the rules would make without writing files.
    Check,
    /// Apply the renames and write changed files.
    Fix,
}

/// Output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary and unified diff (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

fn parse_rule(s: &str) -> Result<RuleId, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level, cli.format);

    let format = cli.format;
    match execute(cli) {
        Ok(response) => match emit(&response, format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => report_error(&StyleError::from(err), format),
        },
        Err(err) => report_error(&err, format),
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` overrides `--log-level`.
///
/// With `--format json` log lines are JSON objects too.
fn init_tracing(level: LogLevel, format: OutputFormat) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);
    match format {
        OutputFormat::Json => builder.json().init(),
        OutputFormat::Text => builder.init(),
    }
}

fn execute(cli: Cli) -> Result<StyleResponse, StyleError> {
    let workspace = match cli.workspace {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| StyleError::internal(format!("failed to get current directory: {}", e)))?,
    };
    let cancel = CancellationToken::new();
    match cli.command {
        Command::Check => run_check(&workspace, &cli.rules, &cancel),
        Command::Fix => run_fix(&workspace, &cli.rules, &cancel),
    }
}

fn emit(response: &StyleResponse, format: OutputFormat) -> io::Result<()> {
    let mut stdout = io::stdout();
    match format {
        OutputFormat::Json => emit_response(response, &mut stdout)?,
        OutputFormat::Text => write!(stdout, "{}", render_text(response))?,
    }
    stdout.flush()
}

fn report_error(err: &StyleError, format: OutputFormat) -> ExitCode {
    let code = OutputErrorCode::from(err);
    match format {
        OutputFormat::Json => {
            let _ = emit_response(&ErrorResponse::from_error(err), &mut io::stdout());
            let _ = io::stdout().flush();
        }
        OutputFormat::Text => eprintln!("error: {}", err),
    }
    ExitCode::from(code.code())
}
