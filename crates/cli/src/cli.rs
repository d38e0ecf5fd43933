//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::OutputMode;
use std::path::PathBuf;

/// Result Dispatch - classify a finished execution and write one output
#[derive(Parser, Debug)]
#[command(
    name = "result-dispatch",
    author,
    version,
    about = "Execution result classification and dispatch",
    long_about = "Reads an execution record (job kind, result, output rows), picks the \n\
                  output strategy (produced file, result document, single cell or row \n\
                  set) and writes exactly one serialized output."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "RESULT_DISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "RESULT_DISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch an execution record to a sink
    Dispatch(DispatchArgs),

    /// Print the strategy that would be chosen, without writing output
    Classify(ClassifyArgs),

    /// Validate configuration file without dispatching
    Validate(ValidateArgs),
}

/// Arguments for the `dispatch` command
#[derive(Parser, Debug, Clone)]
pub struct DispatchArgs {
    /// Execution record (JSON: kind, result, fields, rows)
    #[arg(short, long, env = "RESULT_DISPATCH_INPUT")]
    pub input: PathBuf,

    /// Dispatcher configuration file (TOML or JSON)
    #[arg(short, long, env = "RESULT_DISPATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where the response goes
    #[arg(long, value_enum, default_value = "stdout")]
    pub sink: SinkKind,

    /// Body path for the file sink
    #[arg(short, long, required_if_eq("sink", "file"))]
    pub output: Option<PathBuf>,

    /// Request download semantics (suggested filename header)
    #[arg(long)]
    pub download: bool,

    /// Override the configured output mode
    #[arg(long, value_parser = parse_output_mode)]
    pub mode: Option<OutputMode>,

    /// Base directory for relative produced-file locations
    #[arg(long)]
    pub files_dir: Option<PathBuf>,

    /// Channel buffer size for streamed rows
    #[arg(long, default_value = "256", env = "RESULT_DISPATCH_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "RESULT_DISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `classify` command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Execution record (JSON)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Dispatcher configuration file (TOML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the configured output mode
    #[arg(long, value_parser = parse_output_mode)]
    pub mode: Option<OutputMode>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Response destination
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SinkKind {
    /// Process stdout
    #[default]
    Stdout,
    /// File with a headers sidecar
    File,
    /// Log a summary only
    Log,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

fn parse_output_mode(value: &str) -> Result<OutputMode, String> {
    value.parse().map_err(|e: contracts::ContractError| e.to_string())
}
