//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::shapes::ShapeKind;

/// Top-level CLI parser for `patchwright`.
#[derive(Debug, Parser)]
#[command(name = "patchwright", version, about = "Turn requests into file edits")]
pub struct Cli {
    /// Workspace root the file-store operates on.
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,
    /// Config file; defaults to `patchwright.toml` in the workspace.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Handle a request: answer it, or plan and apply file changes.
    Ask {
        /// The request text.
        request: String,
        /// Apply changes to an in-memory copy and print them instead.
        #[arg(long)]
        dry_run: bool,
    },
    /// Decode raw generator output and print the shape with its quality.
    Decode {
        /// Shape to decode into.
        #[arg(long, value_enum)]
        shape: ShapeKind,
        /// File with the raw output; reads stdin when omitted.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Execute a task list from a file.
    Execute {
        /// File holding a task list, decoded leniently.
        #[arg(long)]
        plan: PathBuf,
        /// Apply changes to an in-memory copy and print them instead.
        #[arg(long)]
        dry_run: bool,
    },
}
