//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xdisc")]
#[command(about = "Extract title details from Xbox and Xbox 360 disc images", long_about = None)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Detect the platform of an ISO and print its title details
    Details {
        /// Disc image to inspect
        iso: PathBuf,

        /// Working directory shared with xextool (overrides settings)
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Path to the xextool executable (overrides settings)
        #[arg(long)]
        xextool: Option<PathBuf>,

        /// Write the thumbnail image to this file
        #[arg(long)]
        thumbnail: Option<PathBuf>,

        /// Print the details as TOML instead of a table
        #[arg(long)]
        toml: bool,
    },

    /// Manage tool and directory settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show the current settings and resolved values
    Show,

    /// Print the settings file path
    Path,

    /// Set the xextool path (omit to clear)
    SetXextool {
        path: Option<PathBuf>,
    },

    /// Set the working directory (omit to clear)
    SetWorkDir {
        dir: Option<PathBuf>,
    },
}
