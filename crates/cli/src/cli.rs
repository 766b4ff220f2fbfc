//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Melody Console - monitoring reports, graphs and dumps over HTTP
#[derive(Parser, Debug)]
#[command(
    name = "melody-console",
    author,
    version,
    about = "Monitoring console for a running application",
    long_about = "Serves the monitoring console over HTTP: HTML dashboards, PDF reports,\n\
                  PNG graphs, deployment descriptors and serialized snapshots for\n\
                  collector servers. Also renders single reports offline."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MELODY_VERBOSE")]
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
        env = "MELODY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the console over HTTP
    Serve(ServeArgs),

    /// Dispatch one request offline and write the response body
    Render(RenderArgs),

    /// Validate configuration file without serving
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "melody.toml", env = "MELODY_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address from configuration
    #[arg(long, env = "MELODY_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Override the system actions switch from configuration
    #[arg(long, env = "MELODY_SYSTEM_ACTIONS")]
    pub system_actions: Option<bool>,

    /// Prometheus exporter address (disabled when absent)
    #[arg(long, env = "MELODY_METRICS_LISTEN")]
    pub metrics_listen: Option<SocketAddr>,

    /// Validate configuration and exit without serving
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `render` command
#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "melody.toml", env = "MELODY_CONFIG")]
    pub config: PathBuf,

    /// Query string of the request, e.g. `format=pdf&period=week`
    #[arg(long, default_value = "")]
    pub query: String,

    /// Rendering locale (defaults to English)
    #[arg(long)]
    pub locale: Option<String>,

    /// Ask for a gzip-compressed HTML body
    #[arg(long)]
    pub gzip: bool,

    /// Output file (stdout when absent)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print response headers to stderr
    #[arg(long)]
    pub headers: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "melody.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "melody.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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
