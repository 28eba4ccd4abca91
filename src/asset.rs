//! Release asset selection.
//!
//! Every asset of every candidate release gets a score from the platform
//! profile plus optional user keywords; the single best asset is installed.

use crate::error::{IrError, Result};
use crate::platform::PlatformProfile;
use crate::types::{Release, ReleaseAsset};
use std::cmp::Ordering;

pub const ARCHIVE_EXTENSIONS: &[&str] = &[".tar.gz", ".tgz", ".zip", ".tar"];
pub const PACKAGE_EXTENSIONS: &[&str] = &[".deb", ".rpm", ".pkg", ".msi", ".dmg"];
pub const EXECUTABLE_EXTENSIONS: &[&str] = &[".exe", ".bin", ".app"];

/// Patterns that are always part of the match set, rewarding packaged binaries.
const ARCHIVE_HINTS: &[&str] = &["tar", "zip"];
const DEBUG_MARKERS: &[&str] = &["debug", "dbg"];

/// Multipliers and bonuses applied on top of the pattern-match ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    /// Multiplier when the filename names another OS.
    pub foreign_os: f64,
    /// Multiplier when the filename names another architecture family.
    pub foreign_arch: f64,
    /// Multiplier for `.tar.gz`, `.tgz`, `.zip`, `.tar`.
    pub archive: f64,
    /// Multiplier for `.deb`, `.rpm`, `.pkg`, `.msi`, `.dmg`.
    pub package: f64,
    /// Added when the asset looks like a raw executable or an archive.
    pub runnable_bonus: f64,
    /// Multiplier for debug builds.
    pub debug: f64,
    /// Added when the asset is smaller than `small_size_limit`.
    pub small_size_bonus: f64,
    pub small_size_limit: u64,
}

impl ScoreWeights {
    pub const DEFAULT: ScoreWeights = ScoreWeights {
        foreign_os: 0.1,
        foreign_arch: 0.5,
        archive: 2.0,
        package: 0.3,
        runnable_bonus: 0.2,
        debug: 0.8,
        small_size_bonus: 0.1,
        small_size_limit: 100 * 1024 * 1024,
    };
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub struct AssetSelector<'a> {
    profile: &'a PlatformProfile,
    patterns: Vec<String>,
    weights: ScoreWeights,
}

impl<'a> AssetSelector<'a> {
    pub fn new(profile: &'a PlatformProfile) -> Self {
        Self::with_keywords::<&str>(profile, &[])
    }

    pub fn with_keywords<S: AsRef<str>>(profile: &'a PlatformProfile, extra_keywords: &[S]) -> Self {
        let mut patterns: Vec<String> = Vec::new();
        let candidates = std::iter::once(profile.os.as_str())
            .chain(profile.arch_aliases.iter().map(String::as_str))
            .chain(extra_keywords.iter().map(AsRef::as_ref))
            .chain(ARCHIVE_HINTS.iter().copied());

        for pattern in candidates {
            let pattern = pattern.trim().to_lowercase();
            if !pattern.is_empty() && !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }

        AssetSelector {
            profile,
            patterns,
            weights: ScoreWeights::default(),
        }
    }

    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Score a single asset. Zero means it matched no pattern at all.
    pub fn score(&self, asset: &ReleaseAsset) -> f64 {
        let name = asset.filename.to_lowercase();
        let w = &self.weights;

        let match_count = self
            .patterns
            .iter()
            .filter(|p| name.contains(p.as_str()))
            .count();
        if match_count == 0 {
            return 0.0;
        }

        let mut score = match_count as f64 / self.patterns.len() as f64;

        if self
            .profile
            .foreign_os_tokens()
            .iter()
            .any(|t| name.contains(t))
        {
            score *= w.foreign_os;
        }
        if self
            .profile
            .foreign_arch_tokens()
            .iter()
            .any(|t| name.contains(t))
        {
            score *= w.foreign_arch;
        }

        let archive = is_archive_name(&name);
        if archive {
            score *= w.archive;
        } else if is_package_name(&name) {
            score *= w.package;
        }

        if archive || is_executable_asset(asset) {
            score += w.runnable_bonus;
        }

        if DEBUG_MARKERS.iter().any(|m| name.contains(m)) {
            score *= w.debug;
        }

        if asset.size_bytes < w.small_size_limit {
            score += w.small_size_bonus;
        }

        score
    }

    /// Pick the best asset across `releases`.
    pub fn select<'r>(&self, releases: &'r [Release]) -> Result<&'r ReleaseAsset> {
        self.select_with_release(releases).map(|(_, asset)| asset)
    }

    /// Like [`select`](Self::select), also returning the release that owns the asset.
    ///
    /// Releases are visited newest `published_at` first (unparsable dates
    /// last) and assets by filename; on an exact score tie the first visited
    /// asset wins.
    pub fn select_with_release<'r>(
        &self,
        releases: &'r [Release],
    ) -> Result<(&'r Release, &'r ReleaseAsset)> {
        if releases.is_empty() {
            return Err(IrError::NoReleases);
        }

        let mut best: Option<(&Release, &ReleaseAsset)> = None;
        let mut best_score = 0.0_f64;

        for release in newest_first(releases) {
            let mut assets: Vec<&ReleaseAsset> = release.assets.iter().collect();
            assets.sort_by(|a, b| a.filename.cmp(&b.filename));

            for asset in assets {
                let score = self.score(asset);
                tracing::trace!("Asset '{}' ({}): score {:.4}", asset.filename, release.tag, score);
                if score > best_score {
                    best_score = score;
                    best = Some((release, asset));
                }
            }
        }

        match best {
            Some((release, asset)) => {
                tracing::debug!(
                    "Selected '{}' from {} with score {:.4}",
                    asset.filename,
                    release.tag,
                    best_score
                );
                Ok((release, asset))
            }
            None => Err(IrError::NoSuitableAsset {
                os: self.profile.os.clone(),
                arch: self.profile.arch_primary.clone(),
            }),
        }
    }
}

/// Releases ordered newest `published_at` first; unparsable dates sort last
/// and keep their relative order.
pub fn newest_first(releases: &[Release]) -> Vec<&Release> {
    let mut ordered: Vec<&Release> = releases.iter().collect();
    ordered.sort_by(|a, b| match (a.published(), b.published()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    ordered
}

pub fn is_archive_name(name: &str) -> bool {
    let name = name.to_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

pub fn is_package_name(name: &str) -> bool {
    let name = name.to_lowercase();
    PACKAGE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Whether an asset looks like a raw executable by name or content type.
pub fn is_executable_asset(asset: &ReleaseAsset) -> bool {
    let name = asset.filename.to_lowercase();
    if EXECUTABLE_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return true;
    }

    let base = name.rsplit('/').next().unwrap_or(&name);
    if !base.contains('.') {
        return true;
    }

    let content_type = asset.content_type.to_lowercase();
    content_type.contains("executable") || content_type.contains("binary")
}
