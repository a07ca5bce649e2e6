//! Fixed-backoff retry for transient release store failures.
//!
//! Create, upload and publish calls are wrapped by [`RetryingStore`]; every
//! other store call passes straight through. Only errors reported as
//! recoverable (transport failures and 5xx/429 responses) are retried.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use super::store::ReleaseStore;
use super::types::{Asset, Release, ReleaseSpec};
use crate::error::{RemoteError, Result};

/// Default number of attempts, including the first one
pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Default wait between two attempts
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(3);

/// Bounded retry with a fixed wait between attempts. No jitter, no growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub attempts: u32,
    /// Wait between two attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Parse a number from an environment variable, clamped to `max`
    fn parse_env(var_name: &str, default: u64, max: u64) -> u64 {
        std::env::var(var_name)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|v| v.min(max))
            .unwrap_or(default)
    }

    /// Create a policy from `GHR_RETRY_ATTEMPTS` / `GHR_RETRY_BACKOFF_SECS`
    /// with fallback to the defaults
    pub fn from_env() -> Self {
        let attempts = Self::parse_env("GHR_RETRY_ATTEMPTS", DEFAULT_ATTEMPTS as u64, 10) as u32;
        let backoff = Self::parse_env("GHR_RETRY_BACKOFF_SECS", DEFAULT_BACKOFF.as_secs(), 60);

        Self {
            attempts: attempts.max(1),
            backoff: Duration::from_secs(backoff),
        }
    }
}

/// Run `operation` until it succeeds, fails with an unrecoverable error, or
/// `policy.attempts` attempts have been made
pub async fn retry_fixed<F, T, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_recoverable() => {
                log::debug!("{} failed with unrecoverable error: {}", operation_name, e);
                return Err(e);
            }
            Err(e) if attempt >= attempts => {
                log::warn!(
                    "{} failed after {} attempt(s): {}",
                    operation_name,
                    attempt,
                    e
                );
                return Err(e);
            }
            Err(e) => {
                log::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:.1}s",
                    operation_name,
                    attempt,
                    attempts,
                    e,
                    policy.backoff.as_secs_f64()
                );
                attempt += 1;
                tokio::time::sleep(policy.backoff).await;
            }
        }
    }
}

/// Run one store call under an optional deadline
///
/// An expired deadline becomes [`RemoteError::Timeout`], which is never
/// retried.
pub async fn with_deadline<T, Fut>(
    deadline: Option<Duration>,
    operation_name: &str,
    operation: Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let Some(limit) = deadline else {
        return operation.await;
    };

    match tokio::time::timeout(limit, operation).await {
        Ok(outcome) => outcome,
        Err(_) => Err(RemoteError::Timeout {
            operation: operation_name.to_string(),
            elapsed: limit,
        }
        .into()),
    }
}

/// Store decorator applying a [`RetryPolicy`] to create, upload and publish,
/// and an optional deadline to every single call
///
/// The deadline bounds one attempt, so backoff waits and later attempts never
/// count against it.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
    deadline: Option<Duration>,
}

impl<S: ReleaseStore> RetryingStore<S> {
    /// Wrap `inner` with `policy` and no deadline
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            deadline: None,
        }
    }

    /// Bound every call (every attempt, when retried) by `deadline`
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: ReleaseStore> ReleaseStore for RetryingStore<S> {
    async fn create_release(&self, spec: &ReleaseSpec) -> Result<Release> {
        let name = "create release";
        retry_fixed(&self.policy, name, || {
            with_deadline(self.deadline, name, self.inner.create_release(spec))
        })
        .await
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        with_deadline(
            self.deadline,
            "get release by tag",
            self.inner.get_release_by_tag(tag),
        )
        .await
    }

    async fn delete_release(&self, release_id: u64) -> Result<()> {
        with_deadline(
            self.deadline,
            "delete release",
            self.inner.delete_release(release_id),
        )
        .await
    }

    async fn delete_tag(&self, tag: &str) -> Result<()> {
        with_deadline(self.deadline, "delete tag", self.inner.delete_tag(tag)).await
    }

    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset> {
        let operation_name = format!("upload {}", path.display());
        let name = operation_name.as_str();
        retry_fixed(&self.policy, name, || {
            with_deadline(self.deadline, name, self.inner.upload_asset(release, path))
        })
        .await
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        with_deadline(
            self.deadline,
            "delete release asset",
            self.inner.delete_asset(asset_id),
        )
        .await
    }

    async fn list_assets(&self, release_id: u64) -> Result<Vec<Asset>> {
        with_deadline(
            self.deadline,
            "list release assets",
            self.inner.list_assets(release_id),
        )
        .await
    }

    async fn publish_release(&self, release_id: u64) -> Result<Release> {
        let name = "publish release";
        retry_fixed(&self.policy, name, || {
            with_deadline(self.deadline, name, self.inner.publish_release(release_id))
        })
        .await
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        with_deadline(self.deadline, "list releases", self.inner.list_releases()).await
    }
}
