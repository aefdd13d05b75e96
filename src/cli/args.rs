//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Family tree hierarchy builder, structure validator and layout engine
#[derive(Parser, Debug)]
#[command(name = "kinlayout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out a snapshot and print node positions
    Layout {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
        /// Print the full view as JSON
        #[arg(long)]
        json: bool,
        /// Width to center the tree in (overrides config)
        #[arg(long)]
        viewport_width: Option<f64>,
    },

    /// Check single-spouse and connectivity rules
    Validate {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Show the hierarchy as a text tree
    Tree {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Count generations
    Generations {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
    },

    /// Compute the viewport that fits the whole tree
    Fit {
        /// Snapshot file (.json or .toml)
        #[arg(value_hint = ValueHint::FilePath)]
        snapshot: PathBuf,
        /// Surface width (overrides config)
        #[arg(long)]
        width: Option<f64>,
        /// Surface height (overrides config)
        #[arg(long)]
        height: Option<f64>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show global config file location
    Path,
    /// Print a commented template
    Template,
}
