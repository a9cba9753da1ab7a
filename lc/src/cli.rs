//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// lc - drive the loading coordinator from the command line
#[derive(Parser)]
#[command(
    name = "lc",
    about = "Simulate operations and navigation against the loading coordinator",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the route policy table, or how one path resolves
    Routes {
        /// Path (optionally with ?query) to resolve
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Run one simulated operation under a loading session
    Run {
        /// How long the work takes
        #[arg(short, long, default_value_t = 100)]
        work_ms: u64,

        /// Minimum time the indicator stays up
        #[arg(short = 'm', long, default_value_t = 1000)]
        min_ms: u64,

        /// Indicator message (defaults to the configured one)
        #[arg(long)]
        message: Option<String>,

        /// Make the work fail
        #[arg(long)]
        fail: bool,

        /// Absorb the failure with a handler instead of reporting it
        #[arg(long, requires = "fail")]
        absorb: bool,

        /// Never finish the work; force-hide after this many milliseconds
        #[arg(long, conflicts_with_all = ["fail", "work_ms"])]
        stall_ms: Option<u64>,
    },

    /// Run a simulated multi-step sequence under one session
    Sequence {
        /// Number of steps
        #[arg(short, long, default_value_t = 3)]
        steps: u32,

        /// Duration of each step
        #[arg(long, default_value_t = 100)]
        step_ms: u64,

        /// Minimum time the indicator stays up for the whole sequence
        #[arg(short = 'm', long, default_value_t = 500)]
        min_ms: u64,

        /// Indicator message (defaults to the configured one)
        #[arg(long)]
        message: Option<String>,

        /// 1-based step that fails
        #[arg(long)]
        fail_at: Option<u32>,
    },

    /// Feed navigation targets through the route session
    Navigate {
        /// Targets such as /dashboard or /reports?year=2024
        #[arg(required = true, value_name = "TARGET")]
        targets: Vec<String>,

        /// Delay between navigations
        #[arg(short, long, default_value_t = 300)]
        gap_ms: u64,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("loadcoord")
        .join("logs")
        .join("loadcoord.log")
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_routes() {
        let cli = Cli::parse_from(["lc", "routes"]);
        assert!(matches!(cli.command, Command::Routes { path: None }));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_cli_parse_routes_with_path() {
        let cli = Cli::parse_from(["lc", "routes", "--path", "/dashboard?tab=1", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Routes { path } => assert_eq!(path.as_deref(), Some("/dashboard?tab=1")),
            other => panic!("Expected Routes, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::parse_from(["lc", "run"]);
        match cli.command {
            Command::Run {
                work_ms,
                min_ms,
                fail,
                absorb,
                stall_ms,
                ..
            } => {
                assert_eq!(work_ms, 100);
                assert_eq!(min_ms, 1000);
                assert!(!fail);
                assert!(!absorb);
                assert!(stall_ms.is_none());
            }
            other => panic!("Expected Run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_absorb_requires_fail() {
        assert!(Cli::try_parse_from(["lc", "run", "--absorb"]).is_err());
        assert!(Cli::try_parse_from(["lc", "run", "--fail", "--absorb"]).is_ok());
    }

    #[test]
    fn test_cli_stall_conflicts_with_fail() {
        assert!(Cli::try_parse_from(["lc", "run", "--stall-ms", "100", "--fail"]).is_err());
    }

    #[test]
    fn test_cli_parse_sequence() {
        let cli = Cli::parse_from(["lc", "sequence", "--steps", "4", "--fail-at", "2"]);
        match cli.command {
            Command::Sequence { steps, fail_at, .. } => {
                assert_eq!(steps, 4);
                assert_eq!(fail_at, Some(2));
            }
            other => panic!("Expected Sequence, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_navigate_requires_target() {
        assert!(Cli::try_parse_from(["lc", "navigate"]).is_err());
        let cli = Cli::parse_from(["lc", "navigate", "/", "/dashboard"]);
        match cli.command {
            Command::Navigate { targets, gap_ms } => {
                assert_eq!(targets, vec!["/", "/dashboard"]);
                assert_eq!(gap_ms, 300);
            }
            other => panic!("Expected Navigate, got {other:?}"),
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("plain".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
