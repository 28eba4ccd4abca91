use crate::error::{IrError, Result};
use std::fmt;
use std::str::FromStr;

/// Separator between repository URL and tool name in the persisted key.
pub const KEY_SEPARATOR: char = '#';

/// Identity of an installed tool: the repository it came from plus the
/// name it was installed under.
///
/// Only the state file sees the `url#name` form; everything else works with
/// the two fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolKey {
    url: String,
    name: String,
}

impl ToolKey {
    pub fn new(url: &str, name: &str) -> Result<Self> {
        let url = url.trim().trim_end_matches('/');
        let name = name.trim();

        if url.is_empty() {
            return Err(invalid(url, name, "repository URL cannot be empty"));
        }
        if name.is_empty() {
            return Err(invalid(url, name, "tool name cannot be empty"));
        }
        if name.contains(KEY_SEPARATOR) {
            return Err(invalid(
                url,
                name,
                &format!("tool name cannot contain '{}'", KEY_SEPARATOR),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(invalid(url, name, "tool name cannot contain path separators"));
        }

        Ok(ToolKey {
            url: url.to_string(),
            name: name.to_string(),
        })
    }

    /// Key for `url`, named after `name` or, when absent, the last path
    /// segment of the URL (`https://github.com/owner/repo` -> `repo`).
    pub fn for_repo(url: &str, name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => Self::new(url, name),
            None => Self::new(url, &default_tool_name(url)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.url, KEY_SEPARATOR, self.name)
    }
}

impl FromStr for ToolKey {
    type Err = IrError;

    /// Everything before the last `#` is the URL, everything after is the name.
    fn from_str(value: &str) -> Result<Self> {
        match value.rsplit_once(KEY_SEPARATOR) {
            Some((url, name)) => ToolKey::new(url, name),
            None => Err(IrError::InvalidToolKey {
                key: value.to_string(),
                reason: format!("missing '{}' separator", KEY_SEPARATOR),
            }),
        }
    }
}

pub fn default_tool_name(url: &str) -> String {
    url.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .unwrap_or("unknown")
        .to_string()
}

fn invalid(url: &str, name: &str, reason: &str) -> IrError {
    IrError::InvalidToolKey {
        key: format!("{}{}{}", url, KEY_SEPARATOR, name),
        reason: reason.to_string(),
    }
}
