use anyhow::{Context, Result};
use std::path::Path;

use mtstamp::{
    CaptureStats, Cli, Commands, OutputArgs,
    Config,
    ProgressConfig,
    capture, restore,
};

fn main() {
    let cli = Cli::parse_args();
    let operation = cli.command.name();

    if let Err(e) = run(cli) {
        eprintln!("{} error: {:#}", operation, e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Capture { root, output_dir, output } => {
            cmd_capture(&root, output_dir.as_deref(), &config, output)
        },
        Commands::Restore { root, manifest_dir, output } => {
            cmd_restore(&root, manifest_dir.as_deref(), &config, output)
        },
    }
}

/// Explicit --config wins; otherwise search upwards from the working directory
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }

    let current_dir = std::env::current_dir()
        .context("Failed to get current directory")?;
    Ok(Config::discover(&current_dir)?)
}

fn cmd_capture(root: &Path, output_dir: Option<&Path>, config: &Config, output: OutputArgs) -> Result<()> {
    let progress_config = ProgressConfig::from_flags(output.progress, output.no_progress, config.progress);

    let stats = capture(root, output_dir, config, output.verbose, progress_config)?;

    println!("{}", capture_summary(&stats));
    if output.verbose {
        eprintln!("  Files: {}", stats.files);
        if stats.ignored > 0 {
            eprintln!("  Ignored: {}", stats.ignored);
        }
        eprintln!("  Time: {}", stats.elapsed);
    }

    Ok(())
}

fn capture_summary(stats: &CaptureStats) -> String {
    format!("wrote manifest: {} ({} files)", stats.manifest_path.display(), stats.files)
}

fn cmd_restore(root: &Path, manifest_dir: Option<&Path>, config: &Config, output: OutputArgs) -> Result<()> {
    let progress_config = ProgressConfig::from_flags(output.progress, output.no_progress, config.progress);

    let stats = restore(root, manifest_dir, config, output.verbose, progress_config)?;

    println!("restored {} files", stats.restored);
    if output.verbose {
        eprintln!("  Manifest: {}", stats.manifest_path.display());
        eprintln!("  Missing: {}", stats.missing.len());
        eprintln!("  Time: {}", stats.elapsed);
    }

    Ok(())
}
