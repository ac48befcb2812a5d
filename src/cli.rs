use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mtstamp")]
#[command(author, version, about = "Capture and restore file modification times", long_about = None)]
pub struct Cli {
    /// Use this configuration file instead of searching for .mtstamp.toml
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record the mtime of every file under ROOT into a manifest
    #[command(alias = "log")]
    Capture {
        /// Directory to capture (absolute path)
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Directory to write the manifest into (absolute path, default: current directory)
        #[arg(value_name = "OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Reapply the mtimes recorded in a manifest to the files under ROOT
    #[command(alias = "back")]
    Restore {
        /// Directory to restore into (absolute path)
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Directory containing the manifest (absolute path, default: current directory)
        #[arg(value_name = "MANIFEST_DIR")]
        manifest_dir: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Flags shared by capture and restore
#[derive(clap::Args, Debug, Clone, Copy)]
pub struct OutputArgs {
    /// Show verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Force enable progress bar
    #[arg(long = "progress")]
    pub progress: bool,

    /// Force disable progress bar
    #[arg(long = "no-progress", conflicts_with = "progress")]
    pub no_progress: bool,
}

impl Commands {
    /// Operation name used to prefix fatal errors
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Capture { .. } => "capture",
            Commands::Restore { .. } => "restore",
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
