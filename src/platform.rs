use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Normalized description of the machine running the installer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlatformProfile {
    pub os: String,
    pub arch_primary: String,
    /// Accepted spellings of `arch_primary` in asset filenames, in match order.
    pub arch_aliases: Vec<String>,
}

impl PlatformProfile {
    /// Build a profile from raw OS/architecture names as reported by the
    /// runtime (`std::env::consts`) or by Go/uname style strings.
    pub fn new(os: &str, arch: &str) -> Self {
        let os = normalize_os(os);
        let arch_primary = normalize_arch(arch);

        let arch_aliases: Vec<String> = match arch_primary.as_str() {
            "x86_64" => vec!["x86", "x64", "amd64", "amd", "x86_64"],
            "aarch64" => vec!["arm64", "aarch64", "arm"],
            other => vec![other],
        }
        .into_iter()
        .map(String::from)
        .collect();

        PlatformProfile {
            os,
            arch_primary,
            arch_aliases,
        }
    }

    /// The profile of the running process, computed once.
    pub fn current() -> &'static PlatformProfile {
        static CURRENT: OnceLock<PlatformProfile> = OnceLock::new();
        CURRENT.get_or_init(|| {
            let profile = PlatformProfile::new(std::env::consts::OS, std::env::consts::ARCH);
            tracing::debug!(
                "Platform profile: os={}, arch={}, aliases={:?}",
                profile.os,
                profile.arch_primary,
                profile.arch_aliases
            );
            profile
        })
    }

    /// Filename tokens that identify an OS other than this one.
    pub fn foreign_os_tokens(&self) -> &'static [&'static str] {
        match self.os.as_str() {
            "linux" => &["windows", "darwin", "macos", "win32", "win64", ".exe"],
            "darwin" => &["windows", "linux", "win32", "win64", ".exe"],
            "windows" => &["linux", "darwin", "macos"],
            _ => &[],
        }
    }

    /// Filename tokens that identify an architecture family other than this one.
    pub fn foreign_arch_tokens(&self) -> &'static [&'static str] {
        match self.arch_primary.as_str() {
            "x86_64" => &["arm64", "aarch64", "arm", "i386", "i686"],
            "aarch64" => &["x86_64", "amd64", "x64", "i386", "i686"],
            _ => &[],
        }
    }
}

fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "osx" => "darwin".to_string(),
        "windows" | "win32" => "windows".to_string(),
        "linux" => "linux".to_string(),
        other => other.to_string(),
    }
}

fn normalize_arch(arch: &str) -> String {
    match arch.to_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => "x86_64".to_string(),
        "aarch64" | "arm64" => "aarch64".to_string(),
        "x86" | "386" | "i686" => "i386".to_string(),
        other => other.to_string(),
    }
}
