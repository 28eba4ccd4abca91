//! Persisted record of installed tools.
//!
//! The state file is a JSON object mapping `"<repo url>#<tool name>"` to the
//! release that was installed, reduced to the one asset actually used.

use crate::error::{IrError, Result};
use crate::tool_key::ToolKey;
use crate::types::Release;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug, Clone, Default)]
pub struct StateStore {
    path: PathBuf,
    entries: BTreeMap<ToolKey, Release>,
    /// Entries whose key is not `url#name`, written back untouched.
    unparsed: BTreeMap<String, Release>,
}

impl StateStore {
    /// An empty store bound to `path`; nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StateStore {
            path: path.into(),
            entries: BTreeMap::new(),
            unparsed: BTreeMap::new(),
        }
    }

    /// Shorthand for `new` followed by `load`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(path);
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory entries with the file contents.
    ///
    /// A missing, unreadable or corrupt file yields an empty state.
    pub fn load(&mut self) {
        self.entries.clear();
        self.unparsed.clear();

        if !self.path.exists() {
            tracing::debug!("No state file at {}, starting empty", self.path.display());
            return;
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    "Could not read state file {}: {}. Starting empty",
                    self.path.display(),
                    e
                );
                return;
            }
        };

        let raw: BTreeMap<String, Release> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    "State file {} is corrupt: {}. Starting empty",
                    self.path.display(),
                    e
                );
                return;
            }
        };

        for (raw_key, release) in raw {
            match raw_key.parse::<ToolKey>() {
                Ok(key) => {
                    self.entries.insert(key, release);
                }
                Err(e) => {
                    tracing::warn!("Keeping unrecognised state entry as is: {}", e);
                    self.unparsed.insert(raw_key, release);
                }
            }
        }

        tracing::debug!(
            "Loaded {} state entries from {}",
            self.entries.len(),
            self.path.display()
        );
    }

    /// Write all entries to disk, replacing the previous file.
    pub fn save(&self) -> Result<()> {
        let io_err = |source: std::io::Error| IrError::StateIo {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_err)?;

        let content = serde_json::to_string_pretty(&self.snapshot()).map_err(|e| io_err(e.into()))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::debug!("Saved {} state entries", self.entries.len());
        Ok(())
    }

    /// Entries keyed by their persisted form, unrecognised keys included.
    pub fn snapshot(&self) -> BTreeMap<String, &Release> {
        self.unparsed
            .iter()
            .map(|(key, release)| (key.clone(), release))
            .chain(
                self.entries
                    .iter()
                    .map(|(key, release)| (key.to_string(), release)),
            )
            .collect()
    }

    pub fn get(&self, key: &ToolKey) -> Option<&Release> {
        self.entries.get(key)
    }

    /// Update memory only; call [`save`](Self::save) to persist.
    pub fn set(&mut self, key: ToolKey, release: Release) {
        self.entries.insert(key, release);
    }

    pub fn set_and_persist(&mut self, key: ToolKey, release: Release) -> Result<()> {
        self.set(key, release);
        self.save()
    }

    /// Remove from memory only; call [`save`](Self::save) to persist.
    pub fn delete(&mut self, key: &ToolKey) -> Option<Release> {
        self.entries.remove(key)
    }

    pub fn delete_and_persist(&mut self, key: &ToolKey) -> Result<Option<Release>> {
        let removed = self.delete(key);
        self.save()?;
        Ok(removed)
    }

    /// Find an installed tool by the name it was installed under.
    pub fn find_by_name(&self, name: &str) -> Option<(&ToolKey, &Release)> {
        let mut matches = self.entries.iter().filter(|(key, _)| key.name() == name);
        let found = matches.next();
        if found.is_some() && matches.next().is_some() {
            tracing::warn!(
                "Several repositories installed a tool named '{}'; using the first",
                name
            );
        }
        found
    }

    pub fn contains(&self, key: &ToolKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ToolKey> {
        self.entries.keys()
    }

    pub fn items(&self) -> impl Iterator<Item = (&ToolKey, &Release)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
