//! Single-tool operations: install (`get`), remove, hold and listing.
//!
//! Each operation either completes or leaves the state file untouched.

use crate::asset::AssetSelector;
use crate::download::ArchiveInstaller;
use crate::error::{IrError, Result};
use crate::forge::ClientFactory;
use crate::platform::PlatformProfile;
use crate::state::StateStore;
use crate::tool_key::ToolKey;
use crate::types::{Release, ReleaseAsset, RepoMetadata};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What `get` is about to install, resolved before anything is downloaded.
#[derive(Debug, Clone)]
pub struct ResolvedInstall {
    pub key: ToolKey,
    pub metadata: RepoMetadata,
    pub release: Release,
    pub asset: ReleaseAsset,
    pub keywords: Vec<String>,
}

impl ResolvedInstall {
    pub fn name(&self) -> &str {
        self.key.name()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub tag: Option<String>,
    pub name: Option<String>,
    pub keywords: Vec<String>,
    pub include_prerelease: bool,
}

/// One row of `ls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTool {
    pub name: String,
    pub tag: String,
    pub url: String,
    pub held: bool,
}

#[derive(Debug)]
pub struct RemovedTool {
    pub key: ToolKey,
    pub release: Release,
    /// The binary that was deleted, if it was still present.
    pub binary: Option<PathBuf>,
}

/// Query the forge for `url` and pick the asset to install.
pub async fn resolve(
    clients: &dyn ClientFactory,
    profile: &PlatformProfile,
    url: &str,
    options: &GetOptions,
) -> Result<ResolvedInstall> {
    let client = clients.client_for(url)?;
    // Validate the name before touching the network.
    let key = ToolKey::for_repo(&client.source_url(), options.name.as_deref())?;

    let metadata = client.repository().await?;
    let releases = client
        .releases(options.tag.as_deref(), options.include_prerelease)
        .await?;

    let selector = AssetSelector::with_keywords(profile, &options.keywords);
    let (release, asset) = selector.select_with_release(&releases)?;
    tracing::info!(
        "Resolved {} {} -> {}",
        key.name(),
        release.tag,
        asset.filename
    );

    Ok(ResolvedInstall {
        key,
        metadata,
        release: release.clone(),
        asset: asset.clone(),
        keywords: options.keywords.clone(),
    })
}

/// Install a resolved tool and record it. State is written only after the
/// binary is in place.
pub async fn install_resolved(
    resolved: &ResolvedInstall,
    installer: &ArchiveInstaller,
    install_dir: &Path,
    state: &mut StateStore,
) -> Result<PathBuf> {
    let path = installer
        .install(&resolved.asset, install_dir, resolved.name())
        .await?;

    let mut record = resolved.release.with_single_asset(&resolved.asset);
    record.keywords = resolved.keywords.clone();
    if let Some(previous) = state.get(&resolved.key) {
        record.hold_update = previous.hold_update;
    }
    state.set_and_persist(resolved.key.clone(), record)?;

    Ok(path)
}

/// Delete an installed tool's binary and its state entry.
pub fn remove(state: &mut StateStore, name: &str, install_dir: &Path) -> Result<RemovedTool> {
    let key = match state.find_by_name(name) {
        Some((key, _)) => key.clone(),
        None => return Err(IrError::ToolNotFound(name.to_string())),
    };

    let path = install_dir.join(key.name());
    let binary = match fs::remove_file(&path) {
        Ok(()) => Some(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("{} was already gone", path.display());
            None
        }
        Err(source) => return Err(IrError::Install { path, source }),
    };

    let release = state
        .delete_and_persist(&key)?
        .ok_or_else(|| IrError::ToolNotFound(name.to_string()))?;

    Ok(RemovedTool {
        key,
        release,
        binary,
    })
}

/// Set or clear the hold flag of an installed tool.
pub fn hold(state: &mut StateStore, name: &str, held: bool) -> Result<ToolKey> {
    let (key, mut release) = match state.find_by_name(name) {
        Some((key, release)) => (key.clone(), release.clone()),
        None => return Err(IrError::ToolNotFound(name.to_string())),
    };

    release.hold_update = held;
    state.set_and_persist(key.clone(), release)?;
    Ok(key)
}

/// Installed tools sorted by name (case-insensitive).
pub fn list(state: &StateStore, held_only: bool) -> Vec<InstalledTool> {
    let mut tools: Vec<InstalledTool> = state
        .items()
        .filter(|(_, release)| !held_only || release.hold_update)
        .map(|(key, release)| InstalledTool {
            name: key.name().to_string(),
            tag: release.tag.clone(),
            url: key.url().to_string(),
            held: release.hold_update,
        })
        .collect();
    tools.sort_by_key(|t| t.name.to_lowercase());
    tools
}
