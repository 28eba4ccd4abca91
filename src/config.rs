use crate::error::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "install_release";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const STATE_FILE_NAME: &str = "state.json";
pub const BIN_DIR_NAME: &str = "bin";

pub const CONFIG_PATH_ENV: &str = "IR_CONFIG_PATH";
pub const STATE_PATH_ENV: &str = "IR_STATE_PATH";
pub const BIN_DIR_ENV: &str = "IR_BIN_DIR";

/// Persisted user settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ToolConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gitlab_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pre_release: bool,
}

/// Older releases stored the settings under a top-level `config` key.
#[derive(Deserialize)]
struct WrappedConfig {
    config: ToolConfig,
}

pub fn get_user_config_dir() -> PathBuf {
    let path = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    tracing::debug!("User config directory: {}", path.display());
    path
}

pub fn config_file_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => get_user_config_dir().join(CONFIG_FILE_NAME),
    }
}

pub fn state_file_path() -> PathBuf {
    match std::env::var(STATE_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => get_user_config_dir().join(STATE_FILE_NAME),
    }
}

pub fn default_bin_dir() -> PathBuf {
    match std::env::var(BIN_DIR_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(BIN_DIR_NAME),
    }
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: ToolConfig,
}

impl ConfigStore {
    /// Load settings from the default location (or `IR_CONFIG_PATH`).
    pub fn load_default() -> Result<Self> {
        Self::load(config_file_path())
    }

    /// Load settings from `path`. A missing file yields defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        tracing::debug!("Config file path: {}", path.display());

        if !path.exists() {
            return Ok(ConfigStore {
                path,
                config: ToolConfig::default(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| IrError::ConfigIo {
            path: path.clone(),
            message: format!("could not read: {}", e),
        })?;

        let config = parse_config(&content).map_err(|e| IrError::ConfigIo {
            path: path.clone(),
            message: format!("could not parse as JSON: {}", e),
        })?;

        Ok(ConfigStore { path, config })
    }

    pub fn save(&self) -> Result<()> {
        let io_err = |e: std::io::Error| IrError::ConfigIo {
            path: self.path.clone(),
            message: e.to_string(),
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(&self.config).map_err(|e| IrError::ConfigIo {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        fs::write(&self.path, content).map_err(io_err)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// GitHub token from the config file, falling back to `GITHUB_TOKEN`.
    pub fn token(&self) -> Option<String> {
        non_empty(&self.config.token).or_else(|| env_token("GITHUB_TOKEN"))
    }

    /// GitLab token from the config file, falling back to `GITLAB_TOKEN`.
    pub fn gitlab_token(&self) -> Option<String> {
        non_empty(&self.config.gitlab_token).or_else(|| env_token("GITLAB_TOKEN"))
    }

    /// Install directory. `IR_BIN_DIR` wins over the config file.
    pub fn install_path(&self) -> PathBuf {
        if let Ok(dir) = std::env::var(BIN_DIR_ENV) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
        match non_empty(&self.config.path) {
            Some(path) => expand_home(&path),
            None => default_bin_dir(),
        }
    }

    pub fn pre_release(&self) -> bool {
        self.config.pre_release
    }

    pub fn set_token(&mut self, token: &str) -> Result<()> {
        self.config.token = token.to_string();
        self.save()
    }

    pub fn set_gitlab_token(&mut self, token: &str) -> Result<()> {
        self.config.gitlab_token = token.to_string();
        self.save()
    }

    pub fn set_path(&mut self, path: &str) -> Result<()> {
        self.config.path = path.to_string();
        self.save()
    }

    pub fn set_pre_release(&mut self, pre_release: bool) -> Result<()> {
        self.config.pre_release = pre_release;
        self.save()
    }
}

fn parse_config(content: &str) -> serde_json::Result<ToolConfig> {
    if let Ok(wrapped) = serde_json::from_str::<WrappedConfig>(content) {
        return Ok(wrapped.config);
    }
    serde_json::from_str::<ToolConfig>(content)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn env_token(var: &str) -> Option<String> {
    std::env::var(var).ok().and_then(|t| non_empty(&t))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}
