// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Flat flags: one container or --all, plus list/restore actions.

use clap::Parser;
use reimage::config::Overrides;
use reimage::error::{Error, Result};
use reimage::output::OutputMode;
use reimage::types::ContainerName;
use reimage::update::{Target, UpdateOptions};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "reimage")]
#[command(about = "Update running containers to the latest image, keeping their configuration")]
#[command(version)]
pub struct Cli {
    /// Container to update
    #[arg(value_name = "CONTAINER")]
    pub container: Option<String>,

    /// Update every running container
    #[arg(short, long, conflicts_with = "container")]
    pub all: bool,

    /// Replace even if the image is already current
    #[arg(short, long)]
    pub force: bool,

    /// Show running containers and whether an update is available, then exit
    #[arg(
        short,
        long,
        conflicts_with_all = ["container", "all", "force", "dry_run", "skip_backup"]
    )]
    pub list: bool,

    /// Show what would happen without changing anything
    #[arg(short, long)]
    pub dry_run: bool,

    /// Do not write a configuration backup before replacing
    #[arg(short, long)]
    pub skip_backup: bool,

    /// Only print errors and warnings
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print each engine operation, including the recreate command
    #[arg(short, long)]
    pub verbose: bool,

    /// Print one JSON object per result
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,

    /// Recreate a container from a backup file
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["container", "all", "list", "force", "dry_run", "skip_backup"]
    )]
    pub restore: Option<PathBuf>,

    /// Configuration file (default: ./reimage.yml or ~/.config/reimage/config.yml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for backup files
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Normal
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config_path: self.config.clone(),
            backup_dir: self.backup_dir.clone(),
        }
    }

    /// Containers to update; an error if neither a name nor --all was given.
    pub fn target(&self) -> Result<Target> {
        match (&self.container, self.all) {
            (_, true) => Ok(Target::AllRunning),
            (Some(name), false) => ContainerName::new(name)
                .map(Target::Single)
                .map_err(|e| Error::InvalidConfig(format!("{}: {}", name, e))),
            (None, false) => Err(Error::NoTarget),
        }
    }

    pub fn update_options(&self, stop_timeout: Duration) -> UpdateOptions {
        UpdateOptions {
            force: self.force,
            dry_run: self.dry_run,
            skip_backup: self.skip_backup,
            stop_timeout,
        }
    }
}
