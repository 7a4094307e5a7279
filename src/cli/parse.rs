//! CLI parse: clap types for subspec. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Subspec CLI - generate dependency-ordered subspec prompts from a design spec
#[derive(Parser, Debug)]
#[command(name = "subspec")]
#[command(about = "Generate one code-generation prompt per subspec, in dependency order")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable logging entirely
    #[arg(long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable verbose logging (debug level, mirrored to stderr)
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stdout, file+stderr)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate every subspec whose output is not stored yet
    Run {
        /// Regenerate subspecs that already have output
        #[arg(long)]
        force: bool,
        /// Restrict the run to this subspec (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show the order a run would take, without calling the API
    Plan {
        /// Assume stored subspecs are regenerated
        #[arg(long)]
        force: bool,
        /// Restrict the plan to this subspec (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Show each subspec as done, ready or waiting
    Status {
        /// Output format (text or json)
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Check configuration, inputs and the task list
    Validate,
}
