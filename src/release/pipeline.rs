//! End-to-end release run: resolve, replace, upload, publish.

use std::sync::Arc;
use std::time::Duration;

use super::matcher::match_assets;
use super::resolver::{ReleaseResolver, Resolution};
use super::sync::{AssetSynchronizer, SyncFailure, SyncReport};
use crate::error::{ReleaseError, Result};
use crate::github::{Release, ReleaseSpec, ReleaseStore};
use crate::local::LocalAsset;
use crate::{ExitCode, UploadConfig};

/// Result of a release run that got past resolution
#[derive(Debug)]
pub struct PipelineOutcome {
    /// How the release was resolved
    pub resolution: Resolution,
    /// Release state at the end of the run
    pub release: Release,
    /// Delete phase report (empty unless replacing)
    pub deleted: SyncReport,
    /// Upload phase report
    pub uploaded: SyncReport,
    /// Whether the release was published by this run
    pub published: bool,
    /// Why publishing failed after every asset landed; the release stays a draft
    pub publish_error: Option<ReleaseError>,
}

impl PipelineOutcome {
    /// Every failure from both phases
    pub fn failures(&self) -> impl Iterator<Item = &SyncFailure> {
        self.deleted.failures.iter().chain(self.uploaded.failures.iter())
    }

    /// True when no item failed in either phase
    pub fn is_success(&self) -> bool {
        self.deleted.is_success() && self.uploaded.is_success()
    }

    /// Exit code for this outcome
    pub fn exit_code(&self) -> ExitCode {
        match &self.publish_error {
            _ if !self.is_success() => ExitCode::ReleaseError,
            Some(e) => e.exit_code(),
            None => ExitCode::Ok,
        }
    }
}

/// Drives one release run against a store
pub struct ReleasePipeline {
    store: Arc<dyn ReleaseStore>,
    resolver: ReleaseResolver,
    synchronizer: AssetSynchronizer,
    replace: bool,
    recreate: bool,
}

impl ReleasePipeline {
    /// Create a pipeline for `config` over `store`
    pub fn new(store: Arc<dyn ReleaseStore>, config: &UploadConfig) -> Self {
        Self {
            resolver: ReleaseResolver::new(Arc::clone(&store)),
            synchronizer: AssetSynchronizer::new(Arc::clone(&store), config.sync_options()),
            store,
            replace: config.replace,
            recreate: config.recreate,
        }
    }

    /// Override the resolver's settling interval
    pub fn with_settle_interval(mut self, settle_interval: Duration) -> Self {
        self.resolver = self.resolver.with_settle_interval(settle_interval);
        self
    }

    /// Resolve the release for `spec` and synchronize `assets` with it
    ///
    /// Resolution and asset listing errors abort the run. Per-asset failures
    /// and a failed publish are collected into the outcome. When replacing, the delete phase
    /// finishes before any upload starts, and a file whose old asset could not
    /// be deleted is not uploaded. A release created as a draft only to hide
    /// it while assets land is published once every asset succeeded; on any
    /// failure it stays a draft.
    pub async fn run(&self, spec: &ReleaseSpec, assets: &[LocalAsset]) -> Result<PipelineOutcome> {
        let resolution = self.resolver.resolve(spec, self.recreate).await?;
        let release = resolution.release.clone();
        log::info!(
            "Resolved release {} (id {}): {:?}",
            release.tag_name,
            release.id,
            resolution.action
        );

        let deleted = if self.replace {
            let remote = self.store.list_assets(release.id).await?;
            let names: Vec<&str> = assets.iter().map(LocalAsset::name).collect();
            let superseded = match_assets(&remote, names.as_slice());
            log::debug!("{} superseded asset(s) to delete", superseded.len());
            self.synchronizer.delete(&superseded).await
        } else {
            SyncReport::default()
        };

        let pending: Vec<LocalAsset> = assets
            .iter()
            .filter(|asset| !deleted.failed(asset.name()))
            .cloned()
            .collect();
        let uploaded = self.synchronizer.upload(&release, &pending).await;

        let mut outcome = PipelineOutcome {
            resolution,
            release,
            deleted,
            uploaded,
            published: false,
            publish_error: None,
        };

        if outcome.is_success() && !spec.draft && outcome.release.draft {
            log::info!("Publishing release {}", outcome.release.tag_name);
            match self.store.publish_release(outcome.release.id).await {
                Ok(release) => {
                    outcome.release = release;
                    outcome.published = true;
                }
                Err(e) => {
                    log::error!("Publishing {} failed: {}", outcome.release.tag_name, e);
                    outcome.publish_error = Some(e);
                }
            }
        }

        Ok(outcome)
    }
}
