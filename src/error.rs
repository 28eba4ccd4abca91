//! Error taxonomy shared by every part of the installer core.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IrError>;

#[derive(Debug, Error)]
pub enum IrError {
    /// Malformed or unsupported repository URL.
    #[error("unsupported repository '{url}': {reason}")]
    Repository { url: String, reason: String },

    #[error("API request to {url} failed: {message}")]
    Api { url: String, message: String },

    #[error("no releases found")]
    NoReleases,

    #[error("no suitable release asset found for {os}/{arch}")]
    NoSuitableAsset { os: String, arch: String },

    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("failed to extract {}: {message}", .archive.display())]
    Extract { archive: PathBuf, message: String },

    #[error("no binary executable found in {}", .0.display())]
    NoExecutableFound(PathBuf),

    #[error("state file {}: {source}", .path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {}: {message}", .path.display())]
    ConfigIo { path: PathBuf, message: String },

    #[error("invalid tool key '{key}': {reason}")]
    InvalidToolKey { key: String, reason: String },

    #[error("tool {0} not found")]
    ToolNotFound(String),

    #[error("failed to install {}: {source}", .path.display())]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IrError {
    pub(crate) fn repository(url: &str, reason: impl Into<String>) -> Self {
        IrError::Repository {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn api(url: &str, message: impl Into<String>) -> Self {
        IrError::Api {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn download(url: &str, message: impl std::fmt::Display) -> Self {
        IrError::Download {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn extract(archive: &std::path::Path, message: impl std::fmt::Display) -> Self {
        IrError::Extract {
            archive: archive.to_path_buf(),
            message: message.to_string(),
        }
    }
}
