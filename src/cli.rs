// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `wayfinder`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wayfinder",
    version,
    about = "Guide users through collections of workflows, step by step.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the catalog file (TOML).
    ///
    /// Default: `Wayfinder.toml` in the current working directory.
    #[arg(long, global = true, value_name = "PATH", default_value = "Wayfinder.toml")]
    pub catalog: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WAYFINDER_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Parse + validate the catalog and print a summary.
    Check,

    /// Print the synthesized answer schema of a question.
    Schema {
        #[arg(value_name = "QUESTION_ID")]
        question: String,
    },

    /// Start a new engagement with a collection.
    Begin {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long, value_name = "ID")]
        user: String,

        /// Collection id, or `code` / `code@version`.
        #[arg(long, value_name = "ID")]
        collection: String,
    },

    /// Print the progression state of an engagement as JSON.
    State {
        #[command(flatten)]
        target: EngagementArgs,
    },

    /// Apply a step submission read from a JSON file.
    Submit {
        #[command(flatten)]
        target: EngagementArgs,

        /// Path to the submission body (JSON).
        #[arg(long, value_name = "PATH")]
        body: String,

        /// Update the step's existing detail instead of creating it.
        #[arg(long)]
        update: bool,
    },

    /// Finish an engagement.
    Finish {
        #[command(flatten)]
        target: EngagementArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Engagement store snapshot (JSON); created if missing.
    #[arg(long, value_name = "PATH", default_value = "wayfinder-store.json")]
    pub store: String,
}

#[derive(Debug, Clone, Args)]
pub struct EngagementArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[arg(long, value_name = "ID")]
    pub user: String,

    #[arg(long, value_name = "ID")]
    pub engagement: String,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
