//! Command line argument parsing and validation.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{CliError, Result};
use crate::github::ReleaseSpec;

/// Create a GitHub release and upload artifacts to it in parallel
#[derive(Parser, Debug, Clone)]
#[command(
    name = "kodegen_ghr",
    version,
    about = "Create a GitHub release and upload artifacts to it in parallel",
    long_about = "Create a release on GitHub and upload your artifacts to it.
Uploads run in parallel. Set GITHUB_API to target GitHub Enterprise.

Usage:
  kodegen_ghr v1.0.0 dist/             Upload every file in dist/ to v1.0.0
  kodegen_ghr --replace v1.0.0 dist/   Replace assets that were already uploaded
  kodegen_ghr v1.0.2 dist/tool.zip     Upload a single file
  kodegen_ghr --stat                   Show download counts of each release"
)]
pub struct Args {
    /// Release tag
    #[arg(index = 1, value_name = "TAG")]
    pub tag: Option<String>,

    /// File or directory of files to upload
    #[arg(index = 2, value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Repository owner (default: from the origin remote or git config)
    #[arg(short = 'u', long = "username", value_name = "OWNER")]
    pub owner: Option<String>,

    /// Repository name (default: from the origin remote)
    #[arg(short = 'r', long = "repository", value_name = "REPO")]
    pub repo: Option<String>,

    /// GitHub API token
    #[arg(short = 't', long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Commitish the tag is created from (default: the default branch)
    #[arg(short = 'c', long = "commitish", value_name = "COMMITISH")]
    pub commitish: Option<String>,

    /// Release title
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Release notes
    #[arg(short = 'b', long)]
    pub body: Option<String>,

    /// Leave the release unpublished
    #[arg(long)]
    pub draft: bool,

    /// Mark the release as a prerelease
    #[arg(long)]
    pub prerelease: bool,

    /// Maximum concurrent uploads (default: number of logical CPUs)
    #[arg(
        short = 'p',
        long,
        default_value_t = -1,
        allow_negative_numbers = true,
        value_name = "N"
    )]
    pub parallel: i64,

    /// Delete assets with the same name before uploading
    #[arg(long)]
    pub replace: bool,

    /// Delete the release and its tag if they exist, then create them again
    #[arg(long = "delete")]
    pub recreate: bool,

    /// Deadline in seconds for each GitHub API call attempt (0 = none)
    #[arg(long, default_value_t = 0, value_name = "SECS")]
    pub timeout: u64,

    /// Show the number of downloads of each release and quit
    #[arg(long)]
    pub stat: bool,

    /// Print debug output (also enabled by GHR_DEBUG)
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if self.stat {
            return Ok(());
        }

        match (&self.tag, &self.path) {
            (Some(tag), Some(_)) if tag.trim().is_empty() => Err(CliError::InvalidArguments {
                reason: "tag must not be empty".to_string(),
            }
            .into()),
            (Some(_), Some(_)) => Ok(()),
            (None, _) => Err(CliError::MissingArgument {
                argument: "TAG".to_string(),
            }
            .into()),
            (Some(_), None) => Err(CliError::MissingArgument {
                argument: "PATH".to_string(),
            }
            .into()),
        }
    }

    /// Whether debug output was requested by flag or environment
    pub fn debug_enabled(&self) -> bool {
        self.debug || std::env::var_os("GHR_DEBUG").is_some_and(|v| !v.is_empty())
    }

    /// Desired release built from the arguments
    pub fn release_spec(&self) -> Result<ReleaseSpec> {
        let tag = self.tag.clone().ok_or_else(|| CliError::MissingArgument {
            argument: "TAG".to_string(),
        })?;

        Ok(ReleaseSpec {
            tag_name: tag,
            target_commitish: self.commitish.clone(),
            name: self.name.clone(),
            body: self.body.clone(),
            draft: self.draft,
            prerelease: self.prerelease,
        })
    }
}

/// Output settings derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl RuntimeConfig {
    /// Create runtime configuration
    pub fn new(verbose: bool) -> Self {
        Self {
            output: super::OutputManager::new(verbose),
        }
    }

    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        Self::new(args.debug_enabled())
    }
}

impl RuntimeConfig {
    /// Print message
    pub fn println(&self, message: &str) {
        let _ = self.output.println(message);
    }

    /// Print a step header
    pub fn step_println(&self, message: &str) {
        let _ = self.output.step(message);
    }

    /// Print debug message
    pub fn verbose_println(&self, message: &str) {
        let _ = self.output.verbose(message);
    }

    /// Print error message (always shown)
    pub fn error_println(&self, message: &str) {
        self.output.error(message);
    }

    /// Print warning message
    pub fn warning_println(&self, message: &str) {
        let _ = self.output.warn(message);
    }

    /// Print success message
    pub fn success_println(&self, message: &str) {
        let _ = self.output.success(message);
    }

    /// Print highlighted message
    pub fn hot_println(&self, message: &str) {
        let _ = self.output.hot(message);
    }

    /// Print indented text
    pub fn indent(&self, message: &str) {
        let _ = self.output.indent(message);
    }

    /// Check if verbose output is enabled
    pub fn is_verbose(&self) -> bool {
        self.output.is_verbose()
    }
}
