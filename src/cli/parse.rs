//! CLI parse: clap types for exercise-forge. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// exercise-forge - quota-driven language exercise generation
#[derive(Parser)]
#[command(name = "exercise-forge")]
#[command(about = "Generate validated language-learning exercises with streamed progress")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (holds config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (replaces global and workspace config files)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Disable logging entirely
    #[arg(long, default_value = "false", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (when output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run one generation session and print its event stream as ndjson
    Generate {
        /// Topic to generate exercises for
        #[arg(long)]
        topic: String,
        /// Oracle credential
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Judge one answer and print the verdict as JSON
    Check {
        #[arg(long)]
        question: String,
        #[arg(long)]
        user_answer: String,
        #[arg(long)]
        correct_answer: String,
        /// Oracle credential
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Summarize a practice session's results (JSON) into feedback
    Feedback {
        /// Session results as a JSON document
        #[arg(long)]
        results: String,
        /// Oracle credential
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
