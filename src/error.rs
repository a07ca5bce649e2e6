//! Error types for kodegen_ghr operations.
//!
//! This module defines all error types with actionable error messages, recovery
//! suggestions and the process exit code each category maps to.

use std::time::Duration;
use thiserror::Error;

use crate::ExitCode;

/// Result type alias for kodegen_ghr operations
pub type Result<T> = std::result::Result<T, ReleaseError>;

/// Main error type for all kodegen_ghr operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Errors reported by the remote release store
    #[error("GitHub error: {0}")]
    Remote(#[from] RemoteError),

    /// Missing or invalid configuration, detected before any remote call
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the remote release store.
///
/// Every variant produced from an HTTP response carries the status line
/// (e.g. `422 Unprocessable Entity`) so it can be reported verbatim.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The requested entity does not exist
    #[error("{what} not found")]
    NotFound {
        /// Description of the missing entity
        what: String,
    },

    /// Network or server-side failure that may succeed on a later attempt
    #[error("{operation} failed: {reason}")]
    Transient {
        /// Operation that failed
        operation: String,
        /// Status line or transport error
        reason: String,
    },

    /// The store rejected the request because of conflicting state
    #[error("{operation}: invalid status {status} ({hint})")]
    Conflict {
        /// Operation that failed
        operation: String,
        /// HTTP status line
        status: String,
        /// Most likely cause
        hint: String,
    },

    /// Any other unexpected response status
    #[error("{operation}: invalid status {status}")]
    Status {
        /// Operation that failed
        operation: String,
        /// HTTP status line
        status: String,
    },

    /// The operation exceeded its deadline
    #[error("{operation} timed out after {:.1}s", elapsed.as_secs_f64())]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Deadline that was exceeded
        elapsed: Duration,
    },

    /// The response body could not be decoded
    #[error("{operation}: malformed response: {reason}")]
    Decode {
        /// Operation that failed
        operation: String,
        /// Decoder error
        reason: String,
    },
}

/// Configuration errors. All of these abort before any remote call.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API token was found
    #[error(
        "Could not retrieve GitHub API token. Set GITHUB_TOKEN or GH_TOKEN, use --token, or set github.token in git config"
    )]
    TokenNotFound,

    /// Repository owner could not be determined
    #[error("Could not retrieve repository owner: {reason}")]
    OwnerNotFound {
        /// Reason for the error
        reason: String,
    },

    /// Repository name could not be determined
    #[error("Could not retrieve repository name: {reason}")]
    RepoNotFound {
        /// Reason for the error
        reason: String,
    },

    /// The API base URL could not be parsed
    #[error("Invalid GitHub API URL '{url}': {reason}")]
    InvalidApiUrl {
        /// URL that failed to parse
        url: String,
        /// Reason for the error
        reason: String,
    },

    /// The local path does not contain any uploadable file
    #[error("No files to upload in {path}. Path must contain at least one file.")]
    NoLocalAssets {
        /// Path that was enumerated
        path: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Missing required argument
    #[error("Missing required argument: {argument}")]
    MissingArgument {
        /// Argument name
        argument: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl ReleaseError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ReleaseError::Config(ConfigError::TokenNotFound) => vec![
                "Export a token: export GITHUB_TOKEN=<token>".to_string(),
                "Pass one explicitly with --token".to_string(),
                "Store one in git config: git config --global github.token <token>".to_string(),
            ],
            ReleaseError::Config(ConfigError::OwnerNotFound { .. }) => vec![
                "Pass the owner with --username".to_string(),
                "Set it in git config: git config --global github.user <name>".to_string(),
            ],
            ReleaseError::Config(ConfigError::RepoNotFound { .. }) => vec![
                "Pass the repository with --repository".to_string(),
                "Run from a clone whose origin remote points at GitHub".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Conflict { .. }) => vec![
                "Use --replace to delete assets with the same name before uploading".to_string(),
                "Use --delete to recreate the release from scratch".to_string(),
            ],
            ReleaseError::Remote(RemoteError::Timeout { .. }) => vec![
                "Raise the per-operation deadline with --timeout".to_string(),
                "Lower --parallel to reduce bandwidth contention".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    /// Check if this error is recoverable by retrying the same call
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ReleaseError::Remote(RemoteError::Transient { .. }))
    }

    /// Exit code for a run aborted by this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ReleaseError::Config(ConfigError::TokenNotFound) => ExitCode::TokenNotFound,
            ReleaseError::Config(ConfigError::OwnerNotFound { .. }) => ExitCode::OwnerNotFound,
            ReleaseError::Config(ConfigError::RepoNotFound { .. }) => ExitCode::RepoNotFound,
            ReleaseError::Config(ConfigError::InvalidApiUrl { .. }) => ExitCode::InvalidUrl,
            ReleaseError::Config(ConfigError::NoLocalAssets { .. }) => ExitCode::BadArgs,
            ReleaseError::Cli(CliError::InvalidArguments { .. })
            | ReleaseError::Cli(CliError::MissingArgument { .. }) => ExitCode::BadArgs,
            ReleaseError::Remote(_) => ExitCode::ResolveError,
            _ => ExitCode::Error,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        let operation = error
            .url()
            .map(|url| format!("request to {}", url.path()))
            .unwrap_or_else(|| "request".to_string());

        if error.is_decode() {
            return RemoteError::Decode {
                operation,
                reason: error.to_string(),
            };
        }

        // Connect, timeout and body errors never reached a response status
        RemoteError::Transient {
            operation,
            reason: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for ReleaseError {
    fn from(error: reqwest::Error) -> Self {
        ReleaseError::Remote(error.into())
    }
}
