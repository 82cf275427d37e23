//! Command line configuration.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command line configuration for gitcompare.
#[derive(Debug, Clone, Parser)]
#[command(name = "gitcompare", version, about, long_about = None)]
pub struct Config {
    /// Git executable used for diffs and rebases
    #[arg(long, global = true, default_value = "git")]
    pub git: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Supported subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Compare a file or directory against a revision, branch or tag
    Diff {
        /// File or directory to compare
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Commit, branch or tag to compare against
        #[arg(short, long = "ref", default_value = "HEAD")]
        reference: String,

        /// Also write an HTML report to this file
        #[arg(long)]
        html: Option<PathBuf>,

        /// Open the HTML report in a browser
        #[arg(long, requires = "html")]
        open: bool,
    },

    /// List branches and tags to compare against
    Refs {
        /// Path inside the repository
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List recent revisions to compare against
    Log {
        /// Path inside the repository
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Revision to start from
        #[arg(short, long = "ref", default_value = "HEAD")]
        reference: String,

        /// Maximum number of commits to list
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Print a file as it was at a revision
    Show {
        /// File to print
        path: PathBuf,

        /// Commit, branch or tag to read from
        #[arg(short, long = "ref", default_value = "HEAD")]
        reference: String,
    },

    /// Rebase the current branch onto a revision, branch or tag
    Rebase {
        /// Commit, branch or tag to rebase onto
        onto: String,

        /// Repository to rebase
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a path argument does not exist or the reference is
    /// empty. `diff` and `show` accept a missing file inside an existing
    /// directory.
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Log {
                path, reference, ..
            } => {
                require_exists(path)?;
                require_reference(reference)?;
            }
            Command::Diff {
                path, reference, ..
            }
            | Command::Show { path, reference } => {
                require_parent_exists(path)?;
                require_reference(reference)?;
            }
            Command::Refs { path } => require_exists(path)?,
            Command::Rebase { onto, repo, .. } => {
                require_exists(repo)?;
                require_reference(onto)?;
            }
        }

        Ok(())
    }

    /// Log level filter implied by the flags.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        }
    }
}

fn require_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }
    Ok(())
}

/// Files deleted from the working tree are still valid targets, only their
/// directory must exist.
fn require_parent_exists(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    require_exists(parent)
}

fn require_reference(reference: &str) -> Result<()> {
    if reference.trim().is_empty() {
        bail!("Reference must not be empty");
    }
    Ok(())
}
