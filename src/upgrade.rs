//! Re-check installed tools against upstream and reinstall the ones that moved.
//!
//! Checking fans out over the network with at most [`MAX_CONCURRENT_CHECKS`]
//! requests in flight and finishes completely before anything is installed.
//! Installing and state writes then run one tool at a time.

use crate::asset::{newest_first, AssetSelector};
use crate::download::ArchiveInstaller;
use crate::error::{IrError, Result};
use crate::forge::ClientFactory;
use crate::platform::PlatformProfile;
use crate::state::StateStore;
use crate::tool_key::ToolKey;
use crate::types::{Release, ReleaseAsset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

pub const MAX_CONCURRENT_CHECKS: usize = 5;

/// A tool whose upstream latest release differs from the installed one.
#[derive(Debug, Clone)]
pub struct UpgradeCandidate {
    pub key: ToolKey,
    pub name: String,
    pub current_tag: String,
    pub latest_release: Release,
    pub selected_asset: ReleaseAsset,
    pub keywords: Vec<String>,
}

impl UpgradeCandidate {
    pub fn new_tag(&self) -> &str {
        &self.latest_release.tag
    }
}

#[derive(Debug)]
pub struct InstalledUpgrade {
    pub name: String,
    pub from_tag: String,
    pub to_tag: String,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct UpgradeFailure {
    pub name: String,
    pub error: IrError,
}

/// Outcome of [`UpgradeOrchestrator::apply_all`].
#[derive(Debug, Default)]
pub struct UpgradeReport {
    pub installed: Vec<InstalledUpgrade>,
    pub failures: Vec<UpgradeFailure>,
}

impl UpgradeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct UpgradeOrchestrator {
    clients: Arc<dyn ClientFactory>,
    profile: PlatformProfile,
    include_prerelease: bool,
    force: bool,
}

impl UpgradeOrchestrator {
    pub fn new(clients: Arc<dyn ClientFactory>, profile: PlatformProfile) -> Self {
        UpgradeOrchestrator {
            clients,
            profile,
            include_prerelease: false,
            force: false,
        }
    }

    pub fn include_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        self
    }

    /// Treat every non-held tool as a candidate even when its tag is unchanged.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Fetch the latest release of every non-held tool and collect the ones
    /// that changed. Per-tool failures are logged and the tool is left out.
    pub async fn check_all(&self, state: &StateStore) -> Vec<UpgradeCandidate> {
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_CHECKS));
        let candidates: Arc<Mutex<Vec<UpgradeCandidate>>> = Arc::new(Mutex::new(Vec::new()));
        let mut workers = JoinSet::new();

        for (key, release) in state.items() {
            if release.hold_update {
                tracing::info!("Skipping {} (updates held)", key.name());
                continue;
            }

            let key = key.clone();
            let installed = release.clone();
            let clients = Arc::clone(&self.clients);
            let profile = self.profile.clone();
            let semaphore = Arc::clone(&semaphore);
            let candidates = Arc::clone(&candidates);
            let include_prerelease = self.include_prerelease;
            let force = self.force;

            workers.spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                tracing::info!("Fetching: {}", key);

                match check_one(&key, &installed, clients.as_ref(), &profile, include_prerelease, force)
                    .await
                {
                    Ok(Some(candidate)) => candidates.lock().await.push(candidate),
                    Ok(None) => tracing::debug!("{} is up to date", key.name()),
                    Err(e) => tracing::warn!("Could not check {}: {}", key.name(), e),
                }
            });
        }

        // Barrier: every check finishes before the list is read.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Upgrade check task failed: {}", e);
            }
        }

        let mut found = std::mem::take(&mut *candidates.lock().await);
        found.sort_by(|a, b| a.key.cmp(&b.key));
        found
    }

    /// Install each candidate in turn and record it in `state`. A failure is
    /// reported and the next candidate is attempted; nothing is rolled back.
    pub async fn apply_all(
        &self,
        candidates: Vec<UpgradeCandidate>,
        state: &mut StateStore,
        installer: &ArchiveInstaller,
        install_dir: &Path,
    ) -> UpgradeReport {
        let mut report = UpgradeReport::default();

        for candidate in candidates {
            tracing::info!(
                "Updating: {}, {} => {}",
                candidate.name,
                candidate.current_tag,
                candidate.new_tag()
            );

            match apply_one(&candidate, state, installer, install_dir).await {
                Ok(path) => report.installed.push(InstalledUpgrade {
                    name: candidate.name.clone(),
                    from_tag: candidate.current_tag.clone(),
                    to_tag: candidate.new_tag().to_string(),
                    path,
                }),
                Err(error) => {
                    tracing::warn!("Upgrade of {} failed: {}", candidate.name, error);
                    report.failures.push(UpgradeFailure {
                        name: candidate.name.clone(),
                        error,
                    });
                }
            }
        }

        report
    }
}

async fn check_one(
    key: &ToolKey,
    installed: &Release,
    clients: &dyn ClientFactory,
    profile: &PlatformProfile,
    include_prerelease: bool,
    force: bool,
) -> Result<Option<UpgradeCandidate>> {
    let client = clients.client_for(key.url())?;
    let releases = client.releases(None, include_prerelease).await?;

    let latest = newest_first(&releases)
        .into_iter()
        .next()
        .ok_or(IrError::NoReleases)?;

    if latest.tag == installed.tag && !force {
        return Ok(None);
    }

    let asset = AssetSelector::with_keywords(profile, &installed.keywords)
        .select(std::slice::from_ref(latest))?;

    Ok(Some(UpgradeCandidate {
        key: key.clone(),
        name: key.name().to_string(),
        current_tag: installed.tag.clone(),
        latest_release: latest.clone(),
        selected_asset: asset.clone(),
        keywords: installed.keywords.clone(),
    }))
}

async fn apply_one(
    candidate: &UpgradeCandidate,
    state: &mut StateStore,
    installer: &ArchiveInstaller,
    install_dir: &Path,
) -> Result<PathBuf> {
    let path = installer
        .install(&candidate.selected_asset, install_dir, &candidate.name)
        .await?;

    let mut record = candidate
        .latest_release
        .with_single_asset(&candidate.selected_asset);
    record.keywords = candidate.keywords.clone();
    if let Some(previous) = state.get(&candidate.key) {
        record.hold_update = previous.hold_update;
    }
    state.set_and_persist(candidate.key.clone(), record)?;

    Ok(path)
}
