//! The release store seam consumed by the resolver and the synchronizer.

use std::path::Path;

use async_trait::async_trait;

use super::types::{Asset, Release, ReleaseSpec};
use crate::error::Result;

/// Hosted release and asset API
///
/// Implementations must be shareable across tasks; the synchronizer calls
/// them concurrently from many workers.
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Create a release from `spec`
    async fn create_release(&self, spec: &ReleaseSpec) -> Result<Release>;

    /// Look up the published release for `tag`; `None` when there is none
    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>>;

    /// Delete a release object (its tag is left in place)
    async fn delete_release(&self, release_id: u64) -> Result<()>;

    /// Delete the tag reference `tag`
    async fn delete_tag(&self, tag: &str) -> Result<()>;

    /// Upload `path` to `release` under the file's basename
    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset>;

    /// Delete an asset
    async fn delete_asset(&self, asset_id: u64) -> Result<()>;

    /// All assets of a release, across every page
    async fn list_assets(&self, release_id: u64) -> Result<Vec<Asset>>;

    /// Turn a draft release into a published one
    async fn publish_release(&self, release_id: u64) -> Result<Release>;

    /// All releases of the repository, across every page
    async fn list_releases(&self) -> Result<Vec<Release>>;
}
