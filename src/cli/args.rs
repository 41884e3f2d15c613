//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::application::{InputFormat, OutputFormat};

/// Rebuild an organisation chart from a flat, manager-referencing employee list
#[derive(Parser, Debug)]
#[command(name = "orgtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Directory holding the local .orgtree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the hierarchy and write it to a file
    Build {
        /// Flat employee document
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output file (default: configured output_path)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Input format
        #[arg(long, value_enum)]
        input_format: Option<InputFormat>,
    },

    /// Show the hierarchy as a tree
    Tree {
        /// Flat employee document
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
    },

    /// Report problems in the input without writing anything
    Check {
        /// Flat employee document
        #[arg(value_hint = ValueHint::FilePath)]
        input: PathBuf,
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
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Write a config template
    Init {
        /// Write the global config instead of the local one
        #[arg(short, long)]
        global: bool,
    },
}
