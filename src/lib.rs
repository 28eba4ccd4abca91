//! Install single-binary tools from GitHub and GitLab releases.
//!
//! The pipeline is [`forge`] (fetch releases) -> [`asset`] (pick the asset
//! for this platform) -> [`download`] (fetch, unpack, install) -> [`state`]
//! (record what was installed). [`upgrade`] drives it for every installed
//! tool at once.

pub mod asset;
pub mod config;
pub mod download;
pub mod error;
pub mod forge;
pub mod install;
pub mod platform;
pub mod state;
pub mod tool_key;
pub mod types;
pub mod ui;
pub mod upgrade;

pub use asset::{AssetSelector, ScoreWeights};
pub use config::ConfigStore;
pub use download::ArchiveInstaller;
pub use error::{IrError, Result};
pub use forge::{ClientFactory, ForgeClients, RepositoryClient};
pub use platform::PlatformProfile;
pub use state::StateStore;
pub use tool_key::ToolKey;
pub use types::{Release, ReleaseAsset, RepoMetadata};
pub use upgrade::{UpgradeCandidate, UpgradeOrchestrator, UpgradeReport};
