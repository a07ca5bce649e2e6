//! Release resolution and asset synchronization.
//!
//! - `resolver`: reuse, create or recreate the release for a tag
//! - `matcher`: map local file names to remote assets
//! - `sync`: bounded-concurrency upload and delete batches
//! - `pipeline`: the complete run, including the final publish

mod matcher;
mod pipeline;
mod resolver;
mod sync;

pub use matcher::match_assets;
pub use pipeline::{PipelineOutcome, ReleasePipeline};
pub use resolver::{RELEASE_SETTLE_INTERVAL, ReleaseResolver, ResolveAction, Resolution};
pub use sync::{AssetSynchronizer, SyncFailure, SyncOptions, SyncReport};
