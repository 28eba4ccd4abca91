use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Forges send `null` for unset strings; treat that like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Summary of a repository as reported by its forge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RepoMetadata {
    pub full_name: String,
    pub star_count: u64,
    pub primary_language: String,
    pub description: String,
}

/// A single downloadable file attached to a release.
///
/// Field names follow the GitHub release-asset payload, which is also the
/// on-disk state format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReleaseAsset {
    #[serde(rename = "name")]
    pub filename: String,
    #[serde(rename = "browser_download_url")]
    pub download_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub node_id: String,
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl ReleaseAsset {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1_000_000.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Release {
    /// Human-facing repository URL, e.g. `https://github.com/owner/repo`.
    #[serde(rename = "url")]
    pub source_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(rename = "prerelease", default)]
    pub is_prerelease: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hold_update: bool,
    /// Selector keywords given at install time; upgrades reuse them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Release {
    pub fn published(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.published_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Copy of this release carrying only `asset`, the form kept in state.
    pub fn with_single_asset(&self, asset: &ReleaseAsset) -> Release {
        Release {
            assets: vec![asset.clone()],
            ..self.clone()
        }
    }
}
