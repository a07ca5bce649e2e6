//! In-memory release store used by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kodegen_ghr::{Asset, Release, ReleaseError, ReleaseSpec, ReleaseStore, RemoteError, Result};

/// One recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateRelease { tag: String, draft: bool },
    GetReleaseByTag(String),
    DeleteRelease(u64),
    DeleteTag(String),
    UploadAsset(String),
    DeleteAsset(u64),
    ListAssets(u64),
    PublishRelease(u64),
    ListReleases,
}

/// How an injected failure behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every attempt fails with a transient error
    Transient,
    /// Every attempt fails with a 422 conflict
    Conflict,
    /// The first attempt fails with a transient error, later ones succeed
    TransientOnce,
    /// The operation never completes
    Hang,
    /// The worker panics
    Panic,
}

#[derive(Default)]
struct State {
    releases: HashMap<String, Release>,
    assets: HashMap<u64, Vec<Asset>>,
    calls: Vec<Call>,
    upload_faults: HashMap<String, Fault>,
    delete_faults: HashMap<u64, Fault>,
    lookup_fault: Option<Fault>,
    publish_fault: Option<Fault>,
}

/// Store double recording calls and tracking how many operations overlap
#[derive(Default)]
pub struct MockStore {
    state: Mutex<State>,
    next_id: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    delay: Duration,
}

pub fn release(id: u64, tag: &str, draft: bool) -> Release {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "tag_name": tag,
        "draft": draft,
        "prerelease": false,
        "upload_url": format!("https://uploads.github.com/repos/o/r/releases/{}/assets{{?name,label}}", id),
        "html_url": format!("https://github.com/o/r/releases/tag/{}", tag),
    }))
    .expect("valid release json")
}

fn asset(id: u64, name: &str) -> Asset {
    Asset {
        id,
        name: name.to_string(),
        size: 0,
        download_count: 0,
    }
}

fn fault_error(fault: Fault, operation: &str) -> ReleaseError {
    match fault {
        Fault::Transient | Fault::TransientOnce => RemoteError::Transient {
            operation: operation.to_string(),
            reason: "502 Bad Gateway".to_string(),
        }
        .into(),
        Fault::Conflict => RemoteError::Conflict {
            operation: operation.to_string(),
            status: "422 Unprocessable Entity".to_string(),
            hint: "asset likely already exists".to_string(),
        }
        .into(),
        Fault::Hang | Fault::Panic => unreachable!("{:?} never produces an error", fault),
    }
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        }
    }

    /// Every upload/delete takes `delay` (virtual time under a paused clock)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Seed an existing release
    pub fn seed_release(&self, tag: &str, draft: bool) -> Release {
        let release = release(self.next_id.fetch_add(1, Ordering::SeqCst), tag, draft);
        self.state
            .lock()
            .unwrap()
            .releases
            .insert(tag.to_string(), release.clone());
        release
    }

    /// Seed an existing asset on a release
    pub fn seed_asset(&self, release_id: u64, name: &str) -> Asset {
        let asset = asset(self.next_id.fetch_add(1, Ordering::SeqCst), name);
        self.state
            .lock()
            .unwrap()
            .assets
            .entry(release_id)
            .or_default()
            .push(asset.clone());
        asset
    }

    pub fn fail_upload(&self, name: &str, fault: Fault) {
        self.state
            .lock()
            .unwrap()
            .upload_faults
            .insert(name.to_string(), fault);
    }

    pub fn fail_delete(&self, asset_id: u64, fault: Fault) {
        self.state
            .lock()
            .unwrap()
            .delete_faults
            .insert(asset_id, fault);
    }

    /// Make tag lookups fail with a transient error
    pub fn fail_lookup(&self) {
        self.state.lock().unwrap().lookup_fault = Some(Fault::Transient);
    }

    /// Make tag lookups never complete
    pub fn hang_lookup(&self) {
        self.state.lock().unwrap().lookup_fault = Some(Fault::Hang);
    }

    pub fn fail_publish(&self, fault: Fault) {
        self.state.lock().unwrap().publish_fault = Some(fault);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn upload_attempts(&self, name: &str) -> usize {
        self.count(|call| matches!(call, Call::UploadAsset(n) if n == name))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn asset_names(&self, release_id: u64) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut names: Vec<String> = state
            .assets
            .get(&release_id)
            .map(|assets| assets.iter().map(|a| a.name.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    /// Track overlap of one networked operation
    async fn in_flight<T>(&self, fault: Option<Fault>, operation: &str, body: impl FnOnce() -> T) -> Result<T> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if fault == Some(Fault::Hang) {
            std::future::pending::<()>().await;
        }
        if fault == Some(Fault::Panic) {
            panic!("{} worker panicked", operation);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match fault {
            Some(fault) => Err(fault_error(fault, operation)),
            None => Ok(body()),
        }
    }
}

#[async_trait]
impl ReleaseStore for MockStore {
    async fn create_release(&self, spec: &ReleaseSpec) -> Result<Release> {
        self.record(Call::CreateRelease {
            tag: spec.tag_name.clone(),
            draft: spec.draft,
        });
        let release = release(
            self.next_id.fetch_add(1, Ordering::SeqCst),
            &spec.tag_name,
            spec.draft,
        );
        self.state
            .lock()
            .unwrap()
            .releases
            .insert(spec.tag_name.clone(), release.clone());
        Ok(release)
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        self.record(Call::GetReleaseByTag(tag.to_string()));
        let fault = self.state.lock().unwrap().lookup_fault;
        match fault {
            Some(Fault::Hang) => std::future::pending().await,
            Some(fault) => Err(fault_error(fault, "get release")),
            None => Ok(self
                .state
                .lock()
                .unwrap()
                .releases
                .get(tag)
                .filter(|r| !r.draft)
                .cloned()),
        }
    }

    async fn delete_release(&self, release_id: u64) -> Result<()> {
        self.record(Call::DeleteRelease(release_id));
        let mut state = self.state.lock().unwrap();
        state.releases.retain(|_, r| r.id != release_id);
        state.assets.remove(&release_id);
        Ok(())
    }

    async fn delete_tag(&self, tag: &str) -> Result<()> {
        self.record(Call::DeleteTag(tag.to_string()));
        Ok(())
    }

    async fn upload_asset(&self, release: &Release, path: &Path) -> Result<Asset> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.record(Call::UploadAsset(name.clone()));
        let fault = self.state.lock().unwrap().upload_faults.get(&name).copied();
        let fault = match fault {
            Some(Fault::TransientOnce) if self.upload_attempts(&name) > 1 => None,
            fault => fault,
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let uploaded = self.in_flight(fault, "upload", || asset(id, &name)).await?;
        self.state
            .lock()
            .unwrap()
            .assets
            .entry(release.id)
            .or_default()
            .push(uploaded.clone());
        Ok(uploaded)
    }

    async fn delete_asset(&self, asset_id: u64) -> Result<()> {
        self.record(Call::DeleteAsset(asset_id));
        let fault = self.state.lock().unwrap().delete_faults.get(&asset_id).copied();

        self.in_flight(fault, "delete asset", || ()).await?;
        for assets in self.state.lock().unwrap().assets.values_mut() {
            assets.retain(|a| a.id != asset_id);
        }
        Ok(())
    }

    async fn list_assets(&self, release_id: u64) -> Result<Vec<Asset>> {
        self.record(Call::ListAssets(release_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .assets
            .get(&release_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn publish_release(&self, release_id: u64) -> Result<Release> {
        self.record(Call::PublishRelease(release_id));
        let mut state = self.state.lock().unwrap();
        if let Some(fault) = state.publish_fault {
            return Err(fault_error(fault, "publish release"));
        }
        let release = state
            .releases
            .values_mut()
            .find(|r| r.id == release_id)
            .ok_or_else(|| {
                ReleaseError::from(RemoteError::NotFound {
                    what: format!("release {}", release_id),
                })
            })?;
        release.draft = false;
        Ok(release.clone())
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.record(Call::ListReleases);
        Ok(self.state.lock().unwrap().releases.values().cloned().collect())
    }
}
