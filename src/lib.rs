//! # kodegen_ghr
//!
//! Create a GitHub release and upload artifacts to it in parallel.
//!
//! This crate resolves the release to operate against (reusing, creating or
//! recreating it), then synchronizes a set of local files with the release's
//! asset list through a bounded pool of concurrent uploads and deletes.
//! Per-file failures are collected rather than aborting the batch.
//!
//! ## Features
//!
//! - **Deterministic Resolution**: Reuse, create or delete-and-recreate a release by tag
//! - **Fail-Closed Visibility**: Releases are created as drafts and published only after every asset landed
//! - **Bounded Parallelism**: Uploads and deletes run concurrently behind a counting admission gate
//! - **Replace Semantics**: Assets with colliding names are deleted before re-upload
//! - **Complete Diagnostics**: Every failed file is reported, never just the first
//!
//! ## Usage
//!
//! ```bash
//! kodegen_ghr v1.0.0 dist/                # Upload everything in dist/
//! kodegen_ghr --replace v1.0.0 dist/      # Overwrite assets with the same name
//! kodegen_ghr --delete v1.0.0 dist/       # Recreate the release from scratch
//! kodegen_ghr --stat                      # Show download counts and quit
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod error;
pub mod github;
pub mod local;
pub mod release;

// Re-export main types for public API
pub use cli::Args;
pub use error::{CliError, ConfigError, ReleaseError, RemoteError, Result};
pub use github::{Asset, GitHubClient, Release, ReleaseSpec, ReleaseStore, RetryPolicy, RetryingStore};
pub use local::LocalAsset;
pub use release::{
    AssetSynchronizer, PipelineOutcome, RELEASE_SETTLE_INTERVAL, ReleasePipeline,
    ReleaseResolver, ResolveAction, Resolution, SyncFailure, SyncOptions, SyncReport, match_assets,
};

use std::time::Duration;

/// Process exit codes, one per failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Everything succeeded
    Ok = 0,
    /// Unclassified failure
    Error = 10,
    /// Flags could not be parsed
    ParseFlagsError = 11,
    /// Wrong positional arguments or nothing to upload
    BadArgs = 12,
    /// GITHUB_API is not a valid URL
    InvalidUrl = 13,
    /// No API token available
    TokenNotFound = 14,
    /// Repository owner could not be determined
    OwnerNotFound = 15,
    /// Repository name could not be determined
    RepoNotFound = 16,
    /// At least one asset failed to synchronize
    ReleaseError = 17,
    /// The release could not be resolved
    ResolveError = 18,
}

impl ExitCode {
    /// Numeric process exit status
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Configuration for a release run
///
/// Built once from the command line and passed down explicitly; nothing in the
/// crate reads flags from global state.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// GitHub API token
    pub token: String,
    /// API base URL (GitHub Enterprise support)
    pub api_url: String,
    /// Maximum number of concurrent uploads/deletes
    pub parallel: usize,
    /// Delete assets with the same name before uploading
    pub replace: bool,
    /// Delete an existing release and its tag, then create it again
    pub recreate: bool,
    /// Deadline for each individual GitHub API call (each attempt, when retried)
    pub operation_timeout: Option<Duration>,
    /// Retry policy for transient store failures
    pub retry: RetryPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            token: String::new(),
            api_url: github::DEFAULT_API_URL.to_string(),
            parallel: num_cpus::get(),
            replace: false,
            recreate: false,
            operation_timeout: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl UploadConfig {
    /// Synchronizer options derived from this configuration
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            parallelism: self.parallel,
        }
    }
}
