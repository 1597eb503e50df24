use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use serde::Deserialize;
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    constants::{CONFIG_KEY, MANIFEST_FILE},
    error::DepsizeError,
    types::{DependencyMap, Project},
};

/// Size budgets read from the root manifest, all in bytes.
///
/// A missing field means the corresponding budget is unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundlephobiaConfig {
    pub max_size: Option<u64>,
    pub max_gzip_size: Option<u64>,
    pub max_overall_size: Option<u64>,
    pub max_overall_gzip_size: Option<u64>,
}

/// Workspace membership as declared in `package.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Patterns(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    pub fn patterns(&self) -> &[String] {
        match self {
            Workspaces::Patterns(p) => p,
            Workspaces::Object { packages } => packages,
        }
    }
}

/// The parts of `package.json` this tool reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: Option<DependencyMap>,
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
    #[serde(default, rename = "bundle-phobia")]
    pub budget: Option<BundlephobiaConfig>,
}

/// Parsed JSON files keyed by path, scoped to one invocation.
#[derive(Debug, Default)]
pub struct ManifestCache {
    files: DashMap<PathBuf, Arc<Value>>,
}

impl ManifestCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Read and parse a JSON file, returning the cached value on repeated calls.
    pub fn read_json(&self, file: &Path) -> Result<Arc<Value>> {
        if let Some(v) = self.files.get(file) {
            trace!("Cache hit for JSON: {}", file.display());
            return Ok(Arc::clone(v.value()));
        }
        trace!("Reading JSON: {}", file.display());

        let parsed = fs::read_to_string(file)
            .map_err(|e| e.to_string())
            .and_then(|src| serde_json::from_str::<Value>(&src).map_err(|e| e.to_string()));
        let value = match parsed {
            Ok(v) => Arc::new(v),
            Err(e) => {
                debug!("Failed to read {}: {}", file.display(), e);
                return Err(DepsizeError::ParseJson { file: file.to_path_buf() }.into());
            }
        };

        self.files.insert(file.to_path_buf(), Arc::clone(&value));
        Ok(value)
    }

    pub fn read_manifest(&self, file: &Path) -> Result<Manifest> {
        let value = self.read_json(file)?;
        Manifest::deserialize(value.as_ref()).map_err(|e| {
            debug!("Unexpected manifest shape in {}: {}", file.display(), e);
            DepsizeError::ParseJson { file: file.to_path_buf() }.into()
        })
    }

    /// Declared dependencies of a manifest, minus packages that are workspace members.
    pub fn get_dependencies(&self, manifest: &Path, projects: &[Project]) -> Result<DependencyMap> {
        let deps = self.read_manifest(manifest)?.dependencies.unwrap_or_default();
        let total = deps.len();

        let filtered: DependencyMap = deps
            .into_iter()
            .filter(|(name, _)| !projects.iter().any(|p| p.name.as_deref() == Some(name.as_str())))
            .collect();

        debug!(
            "{} dependencies in {} ({} local packages removed)",
            filtered.len(),
            manifest.display(),
            total - filtered.len()
        );
        Ok(filtered)
    }

    /// Budget configuration of the project rooted at `root`.
    pub fn get_config(&self, root: &Path) -> Result<BundlephobiaConfig> {
        let config = self.read_manifest(&root.join(MANIFEST_FILE))?.budget.unwrap_or_default();
        debug!("Loaded '{}' config: {:?}", CONFIG_KEY, config);
        Ok(config)
    }
}
