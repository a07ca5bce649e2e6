//! Concurrent asset upload and delete with per-item failure collection.
//!
//! Every item of a batch runs on its own task and must take a permit from a
//! counting semaphore before going in flight, so at most `parallelism`
//! operations touch the network at once. Items never cancel each other and
//! are attempted exactly once; the batch returns only after every task has
//! finished. Outcomes are fanned back in through the join set.
//!
//! Deadlines and retries belong to the store (see `RetryingStore`), so a
//! deadline always bounds a single attempt.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{CliError, ReleaseError, Result};
use crate::github::{Asset, Release, ReleaseStore};
use crate::local::LocalAsset;

/// Concurrency settings for a synchronization batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Maximum operations in flight (values below 1 are treated as 1)
    pub parallelism: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            parallelism: num_cpus::get(),
        }
    }
}

/// A file or asset that could not be synchronized
#[derive(Debug)]
pub struct SyncFailure {
    /// Asset name (the local basename)
    pub name: String,
    /// Underlying cause
    pub cause: ReleaseError,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.cause)
    }
}

/// Outcome of one batch, in the order items were submitted
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Names of items that succeeded
    pub succeeded: Vec<String>,
    /// Items that failed, with their causes
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// True when no item failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of items attempted
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failures.len()
    }

    /// Whether `name` is among the failures
    pub fn failed(&self, name: &str) -> bool {
        self.failures.iter().any(|failure| failure.name == name)
    }
}

/// Lifecycle of a single item; terminal states are final
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemState {
    Pending,
    InFlight,
    Succeeded,
    Failed,
}

fn transition(kind: &str, name: &str, from: ItemState, to: ItemState) {
    log::debug!("{} {}: {:?} -> {:?}", kind, name, from, to);
}

/// Uploads and deletes release assets with bounded concurrency
pub struct AssetSynchronizer {
    store: Arc<dyn ReleaseStore>,
    options: SyncOptions,
}

impl AssetSynchronizer {
    /// Create a synchronizer over `store`
    pub fn new(store: Arc<dyn ReleaseStore>, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Upload every local asset to `release`
    pub async fn upload(&self, release: &Release, assets: &[LocalAsset]) -> SyncReport {
        let start = std::time::Instant::now();
        let release = Arc::new(release.clone());

        let items: Vec<_> = assets
            .iter()
            .map(|asset| {
                let store = Arc::clone(&self.store);
                let release = Arc::clone(&release);
                let path = asset.path().to_path_buf();
                let operation = async move {
                    let uploaded = store.upload_asset(&release, &path).await?;
                    log::info!("Uploaded {} ({} bytes)", uploaded.name, uploaded.size);
                    Ok::<(), ReleaseError>(())
                };
                (asset.name().to_string(), operation)
            })
            .collect();

        let report = self.run_batch("upload", items).await;
        log::debug!("upload: time: {} ms", start.elapsed().as_millis());
        report
    }

    /// Delete every given remote asset
    pub async fn delete(&self, assets: &[Asset]) -> SyncReport {
        let start = std::time::Instant::now();

        let items: Vec<_> = assets
            .iter()
            .map(|asset| {
                let store = Arc::clone(&self.store);
                let asset_id = asset.id;
                let operation = async move { store.delete_asset(asset_id).await };
                (asset.name.clone(), operation)
            })
            .collect();

        let report = self.run_batch("delete", items).await;
        log::debug!("delete: time: {} ms", start.elapsed().as_millis());
        report
    }

    /// Run one task per item behind the admission gate and collect every outcome
    async fn run_batch<Fut>(&self, kind: &'static str, items: Vec<(String, Fut)>) -> SyncReport
    where
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let gate = Arc::new(Semaphore::new(
            self.options.parallelism.clamp(1, Semaphore::MAX_PERMITS),
        ));
        let mut names = Vec::with_capacity(items.len());
        let mut tasks = JoinSet::new();

        for (index, (name, operation)) in items.into_iter().enumerate() {
            let gate = Arc::clone(&gate);
            let task_name = name.clone();
            names.push(name);

            tasks.spawn(async move {
                // The semaphore is never closed while the batch runs
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let cause = ReleaseError::Cli(CliError::ExecutionFailed {
                            command: format!("{} {}", kind, task_name),
                            reason: e.to_string(),
                        });
                        return (index, Err(cause));
                    }
                };
                transition(kind, &task_name, ItemState::Pending, ItemState::InFlight);

                let outcome = operation.await;

                let terminal = if outcome.is_ok() {
                    ItemState::Succeeded
                } else {
                    ItemState::Failed
                };
                transition(kind, &task_name, ItemState::InFlight, terminal);
                (index, outcome)
            });
        }

        let mut outcomes: Vec<Option<Result<()>>> = names.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                // The failed task is identified below by its empty slot
                Err(e) => log::error!("{} worker task aborted: {}", kind, e),
            }
        }

        let mut report = SyncReport::default();
        for (name, outcome) in names.into_iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| {
                Err(ReleaseError::Cli(CliError::ExecutionFailed {
                    command: format!("{} {}", kind, name),
                    reason: "worker task panicked or was cancelled".to_string(),
                }))
            });
            match outcome {
                Ok(()) => report.succeeded.push(name),
                Err(cause) => {
                    log::warn!("{} {} failed: {}", kind, name, cause);
                    report.failures.push(SyncFailure { name, cause });
                }
            }
        }

        report
    }
}
