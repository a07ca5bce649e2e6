//! Release resolution: decide whether to reuse, create or recreate a release.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::github::{Release, ReleaseSpec, ReleaseStore};

/// Wait after deleting a release and its tag before the tag is created again.
///
/// GitHub processes both deletions asynchronously; creating a release for the
/// same tag right away can collide with the old tag that is still being
/// removed.
pub const RELEASE_SETTLE_INTERVAL: Duration = Duration::from_secs(5);

/// How a release was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveAction {
    /// No release existed for the tag; a new one was created as a draft
    Created,
    /// A draft was requested and created without any lookup
    CreatedDraft,
    /// A published release with the tag already existed and is used as-is
    ReusedExisting,
    /// The existing release and its tag were deleted, then a new draft was created
    RecreatedThenCreated,
}

/// Release to operate against, and how it was obtained
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved release
    pub release: Release,
    /// What the resolver did
    pub action: ResolveAction,
}

/// Resolves a [`ReleaseSpec`] against the existing remote state
pub struct ReleaseResolver {
    store: Arc<dyn ReleaseStore>,
    settle_interval: Duration,
}

impl ReleaseResolver {
    /// Create a resolver using the default settling interval
    pub fn new(store: Arc<dyn ReleaseStore>) -> Self {
        Self {
            store,
            settle_interval: RELEASE_SETTLE_INTERVAL,
        }
    }

    /// Override the wait applied after deleting a release and its tag
    pub fn with_settle_interval(mut self, settle_interval: Duration) -> Self {
        self.settle_interval = settle_interval;
        self
    }

    /// Resolve the release for `spec`
    ///
    /// Drafts are always created fresh. Otherwise the published release with
    /// the same tag is reused, or deleted and recreated when `recreate` is
    /// set. Newly created non-draft releases start as drafts; publishing them
    /// is left to the caller once the assets are in place.
    ///
    /// Any lookup failure other than "not found" aborts resolution.
    pub async fn resolve(&self, spec: &ReleaseSpec, recreate: bool) -> Result<Resolution> {
        if spec.draft {
            log::info!("Creating draft release {}", spec.tag_name);
            let release = self.store.create_release(spec).await?;
            return Ok(Resolution {
                release,
                action: ResolveAction::CreatedDraft,
            });
        }

        let existing = self.store.get_release_by_tag(&spec.tag_name).await?;

        let Some(existing) = existing else {
            log::debug!("Release (with tag {}) not found: create a new one", spec.tag_name);
            if recreate {
                log::warn!(
                    "Recreate requested but release {} not found; creating it",
                    spec.tag_name
                );
            }
            let release = self.store.create_release(&spec.as_draft()).await?;
            return Ok(Resolution {
                release,
                action: ResolveAction::Created,
            });
        };

        if !recreate {
            log::warn!(
                "Found release {} (id {}); using existing one",
                existing.tag_name,
                existing.id
            );
            return Ok(Resolution {
                release: existing,
                action: ResolveAction::ReusedExisting,
            });
        }

        log::info!("Recreating release {} (id {})", existing.tag_name, existing.id);
        self.delete_release(&existing).await?;
        let release = self.store.create_release(&spec.as_draft()).await?;

        Ok(Resolution {
            release,
            action: ResolveAction::RecreatedThenCreated,
        })
    }

    /// Delete `release`, then its tag, then wait for the settling interval
    pub async fn delete_release(&self, release: &Release) -> Result<()> {
        self.store.delete_release(release.id).await?;
        self.store.delete_tag(&release.tag_name).await?;

        if !self.settle_interval.is_zero() {
            log::debug!(
                "Waiting {:.1}s for tag {} deletion to settle",
                self.settle_interval.as_secs_f64(),
                release.tag_name
            );
            tokio::time::sleep(self.settle_interval).await;
        }

        Ok(())
    }
}
