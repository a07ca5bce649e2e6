//! Shared helper functions for command execution.
//!
//! Resolves owner, repository and token from flags, the environment and git
//! configuration, and assembles the `UploadConfig` for a run.

use std::time::Duration;

use anyhow::Context;
use tokio::process::Command;

use crate::cli::Args;
use crate::error::{ConfigError, Result};
use crate::github::{DEFAULT_API_URL, RetryPolicy};
use crate::UploadConfig;

/// Parse GitHub owner/repo from git remote URL
///
/// Supports Git URL formats:
/// - SSH SCP-like: git@github.com:owner/repo.git
/// - HTTPS: https://github.com/owner/repo.git
/// - SSH protocol: ssh://git@ghe.example.com/owner/repo
pub(super) fn parse_github_url(url: &str) -> Option<(String, String)> {
    let url = url.trim().trim_end_matches('/');
    let url = url.strip_suffix(".git").unwrap_or(url);

    let path = if let Some((_, rest)) = url.split_once("://") {
        // Drop the host part
        rest.split_once('/')?.1
    } else if url.contains('@') && url.contains(':') {
        url.split_once(':')?.1
    } else {
        return None;
    };

    let mut parts = path.rsplit('/').filter(|part| !part.is_empty());
    let repo = parts.next()?;
    let owner = parts.next()?;
    Some((owner.to_string(), repo.to_string()))
}

/// Read a single git config value; `None` when the key is unset
async fn git_config(key: &str) -> anyhow::Result<Option<String>> {
    let output = Command::new("git")
        .args(["config", "--get", key])
        .output()
        .await
        .with_context(|| format!("failed to run `git config --get {}`", key))?;

    if !output.status.success() {
        return Ok(None);
    }

    let value = String::from_utf8(output.stdout)
        .with_context(|| format!("git config value for {} is not UTF-8", key))?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// First non-empty git config value among `keys`
async fn git_config_any(keys: &[&str]) -> anyhow::Result<Option<String>> {
    for key in keys {
        if let Some(value) = git_config(key).await? {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Token from `--token`/`GITHUB_TOKEN`, then `GH_TOKEN`, then `github.token`
async fn discover_token(args: &Args) -> Result<String> {
    if let Some(token) = non_empty(args.token.as_deref()) {
        return Ok(token);
    }
    if let Some(token) = non_empty(std::env::var("GH_TOKEN").ok().as_deref()) {
        return Ok(token);
    }

    match git_config("github.token").await {
        Ok(Some(token)) => Ok(token),
        Ok(None) => Err(ConfigError::TokenNotFound.into()),
        Err(e) => {
            log::debug!("token lookup in git config failed: {:#}", e);
            Err(ConfigError::TokenNotFound.into())
        }
    }
}

/// Owner from `--username`, then `github.user`, then `user.name`
async fn discover_owner(args: &Args) -> Result<String> {
    if let Some(owner) = non_empty(args.owner.as_deref()) {
        return Ok(owner);
    }

    match git_config_any(&["github.user", "user.name"]).await {
        Ok(Some(owner)) => Ok(owner),
        Ok(None) => Err(ConfigError::OwnerNotFound {
            reason: "neither github.user nor user.name is set in git config".to_string(),
        }
        .into()),
        Err(e) => Err(ConfigError::OwnerNotFound {
            reason: format!("{:#}", e),
        }
        .into()),
    }
}

/// Repository from `--repository`, then the origin remote URL
async fn discover_repo(args: &Args) -> Result<String> {
    if let Some(repo) = non_empty(args.repo.as_deref()) {
        return Ok(repo);
    }

    let url = match git_config("remote.origin.url").await {
        Ok(Some(url)) => url,
        Ok(None) => {
            return Err(ConfigError::RepoNotFound {
                reason: "remote.origin.url is not set in git config".to_string(),
            }
            .into());
        }
        Err(e) => {
            return Err(ConfigError::RepoNotFound {
                reason: format!("{:#}", e),
            }
            .into());
        }
    };

    parse_github_url(&url).map(|(_, repo)| repo).ok_or_else(|| {
        ConfigError::RepoNotFound {
            reason: format!("could not parse owner/repo from remote URL '{}'", url),
        }
        .into()
    })
}

/// Concurrency from `--parallel`; zero or negative means one per logical CPU
pub(super) fn effective_parallelism(parallel: i64) -> usize {
    if parallel <= 0 {
        num_cpus::get()
    } else {
        usize::try_from(parallel).unwrap_or(usize::MAX)
    }
}

/// Build the run configuration from arguments, environment and git config
///
/// Checked in order: token, owner, repository. The first missing one aborts
/// with its dedicated error.
pub(super) async fn resolve_upload_config(args: &Args) -> Result<UploadConfig> {
    let token = discover_token(args).await?;
    let owner = discover_owner(args).await?;
    let repo = discover_repo(args).await?;

    let api_url = non_empty(std::env::var("GITHUB_API").ok().as_deref())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    Ok(UploadConfig {
        owner,
        repo,
        token,
        api_url,
        parallel: effective_parallelism(args.parallel),
        replace: args.replace,
        recreate: args.recreate,
        operation_timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        retry: RetryPolicy::from_env(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(owner: &str, repo: &str) -> Option<(String, String)> {
        Some((owner.to_string(), repo.to_string()))
    }

    #[test]
    fn test_parse_scp_like_url() {
        assert_eq!(
            parse_github_url("git@github.com:octo/hello.git"),
            pair("octo", "hello")
        );
    }

    #[test]
    fn test_parse_https_url() {
        assert_eq!(
            parse_github_url("https://github.com/octo/hello.git"),
            pair("octo", "hello")
        );
        assert_eq!(
            parse_github_url("https://github.com/octo/hello/"),
            pair("octo", "hello")
        );
    }

    #[test]
    fn test_parse_enterprise_ssh_url() {
        assert_eq!(
            parse_github_url("ssh://git@ghe.example.com/team/tool"),
            pair("team", "tool")
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_github_url("not a url"), None);
        assert_eq!(parse_github_url("https://github.com/"), None);
    }

    #[test]
    fn test_effective_parallelism() {
        assert_eq!(effective_parallelism(4), 4);
        assert_eq!(effective_parallelism(0), num_cpus::get());
        assert_eq!(effective_parallelism(-1), num_cpus::get());
    }
}
