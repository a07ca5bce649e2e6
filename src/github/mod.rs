//! GitHub release store: models, the store seam, the REST client and retries

mod client;
mod retry;
mod store;
mod types;

pub use client::{DEFAULT_API_URL, GitHubClient};
pub use retry::{
    DEFAULT_ATTEMPTS, DEFAULT_BACKOFF, RetryPolicy, RetryingStore, retry_fixed, with_deadline,
};
pub use store::ReleaseStore;
pub use types::{Asset, Release, ReleaseSpec};
