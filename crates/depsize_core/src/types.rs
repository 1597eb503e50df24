use serde::Deserialize;
use std::{collections::BTreeMap, fmt, path::PathBuf};

/// Package name to declared version range
pub type DependencyMap = BTreeMap<String, String>;

/// One workspace member, or the root project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: Option<String>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Npm,
    Yarn,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Pnpm => "pnpm",
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }

    /// Subcommand that adds a dependency
    pub fn add_subcommand(&self) -> &'static str {
        match self {
            PackageManager::Npm => "install",
            PackageManager::Pnpm | PackageManager::Yarn => "add",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size report for a single `name@version`, as returned by the lookup service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageStats {
    pub name: String,
    pub version: String,
    /// Minified size in bytes
    pub size: u64,
    /// Minified and gzipped size in bytes
    pub gzip: u64,
    #[serde(default)]
    pub dependency_count: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub scoped: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub dependency_sizes: Vec<DependencySize>,
}

impl PackageStats {
    pub fn specifier(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Asset {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: u64,
    pub gzip: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DependencySize {
    pub name: String,
    pub approximate_size: u64,
}

/// Split `name@version` into its parts; the version is `None` for a bare name.
///
/// The leading `@` of a scoped package is part of the name.
pub fn split_specifier(specifier: &str) -> (&str, Option<&str>) {
    let search_from = usize::from(specifier.starts_with('@'));
    match specifier[search_from..].find('@') {
        Some(idx) => {
            let at = idx + search_from;
            (&specifier[..at], Some(&specifier[at + 1..]))
        }
        None => (specifier, None),
    }
}
