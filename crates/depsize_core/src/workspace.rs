use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use log::{debug, trace, warn};
use path_clean::clean;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    constants::{
        MANIFEST_FILE, NODE_MODULES, NPM_LOCKFILE, PNPM_LOCKFILE, PNPM_WORKSPACE_FILE,
        ROOT_MARKERS, YARN_LOCKFILE,
    },
    manifest::{ManifestCache, Workspaces},
    types::{PackageManager, Project},
};

/// Directory a command operates on: `dir` resolved against the current
/// directory and lexically normalized, or the current directory itself.
pub fn resolve_working_dir(dir: Option<&Path>) -> Result<PathBuf> {
    let cwd = env::current_dir().context("Failed to read current directory")?;
    let resolved = match dir {
        Some(d) => clean(cwd.join(d)),
        None => cwd,
    };
    debug!("Using working directory: {}", resolved.display());
    Ok(resolved)
}

/// Walk up from `start` to the nearest directory holding a lockfile marker.
///
/// Reaching the home directory or the filesystem root without a match
/// yields `fallback`.
pub fn find_root_directory(start: &Path, fallback: &Path) -> PathBuf {
    let home = directories::BaseDirs::new().map(|b| b.home_dir().to_path_buf());
    debug!("Searching for project root from: {}", start.display());

    let mut current_dir = start;
    loop {
        if home.as_deref() == Some(current_dir) {
            debug!("Reached home directory, using {}", fallback.display());
            return fallback.to_path_buf();
        }

        trace!("Checking for lockfiles at: {}", current_dir.display());
        if ROOT_MARKERS.iter().any(|marker| current_dir.join(marker).exists()) {
            debug!("Found project root at: {}", current_dir.display());
            return current_dir.to_path_buf();
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent,
            None => {
                debug!("No lockfile in any parent folder, using {}", fallback.display());
                return fallback.to_path_buf();
            }
        }
    }
}

/// Detect the package manager of `dir` from the lockfile present.
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    let pm = if dir.join(PNPM_LOCKFILE).exists() {
        PackageManager::Pnpm
    } else if dir.join(NPM_LOCKFILE).exists() {
        PackageManager::Npm
    } else if dir.join(YARN_LOCKFILE).exists() {
        PackageManager::Yarn
    } else {
        PackageManager::Npm
    };
    trace!("Detected package manager {} in {}", pm, dir.display());
    pm
}

#[derive(Debug, Default, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

fn workspace_patterns(root: &Path, manifests: &ManifestCache) -> Result<Vec<String>> {
    let pnpm_workspace = root.join(PNPM_WORKSPACE_FILE);
    if detect_package_manager(root) == PackageManager::Pnpm && pnpm_workspace.exists() {
        debug!("Reading workspace patterns from {}", pnpm_workspace.display());
        let content = fs::read_to_string(&pnpm_workspace)
            .with_context(|| format!("Failed to read {}", pnpm_workspace.display()))?;
        let ws: Option<PnpmWorkspace> = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", pnpm_workspace.display()))?;
        return Ok(ws.unwrap_or_default().packages);
    }

    let manifest = manifests.read_manifest(&root.join(MANIFEST_FILE))?;
    Ok(manifest.workspaces.as_ref().map(Workspaces::patterns).unwrap_or_default().to_vec())
}

fn normalize_pattern(pattern: &str) -> &str {
    pattern.trim_start_matches("./").trim_end_matches('/')
}

fn build_glob_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("Invalid workspace pattern: {}", pattern))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Deepest directory level the patterns can match, `None` when unbounded.
fn max_pattern_depth(patterns: &[&str]) -> Option<usize> {
    let mut depth = 0;
    for pattern in patterns {
        if pattern.contains("**") {
            return None;
        }
        depth = depth.max(pattern.split('/').filter(|s| !s.is_empty()).count());
    }
    Some(depth)
}

/// Expand `patterns` to the directories under `root` that hold a manifest.
fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let (excludes, includes): (Vec<&str>, Vec<&str>) =
        patterns.iter().map(|p| p.trim()).partition(|p| p.starts_with('!'));
    let includes: Vec<&str> = includes.into_iter().map(normalize_pattern).collect();
    let excludes: Vec<&str> =
        excludes.into_iter().map(|p| normalize_pattern(p.trim_start_matches('!'))).collect();

    let include_set = build_glob_set(includes.iter().copied())?;
    let exclude_set = build_glob_set(excludes.iter().copied())?;

    let max_depth = max_pattern_depth(&includes);
    debug!("Expanding {} workspace patterns (max depth {:?})", includes.len(), max_depth);

    let walker = WalkBuilder::new(root)
        .hidden(true)
        // Workspace globs match regardless of ignore files
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .max_depth(max_depth)
        .filter_entry(|e| e.file_name() != NODE_MODULES)
        .build();

    let mut dirs = Vec::new();
    for res in walker {
        let dent = res?;
        if !dent.file_type().is_some_and(|t| t.is_dir()) {
            continue;
        }
        let Ok(rel) = dent.path().strip_prefix(root) else {
            continue;
        };
        if rel.as_os_str().is_empty() {
            continue;
        }

        if include_set.is_match(rel) && !exclude_set.is_match(rel) {
            if dent.path().join(MANIFEST_FILE).is_file() {
                trace!("Matched workspace directory: {}", rel.display());
                dirs.push(dent.path().to_path_buf());
            } else {
                trace!("Skipping {} without {}", rel.display(), MANIFEST_FILE);
            }
        }
    }

    dirs.sort();
    dirs.dedup();
    Ok(dirs)
}

/// Every workspace member declared by the project at `root`.
pub fn find_workspace_projects(root: &Path, manifests: &ManifestCache) -> Result<Vec<Project>> {
    let patterns = workspace_patterns(root, manifests)?;
    if patterns.is_empty() {
        warn!("No workspace patterns declared in {}", root.display());
        return Ok(vec![]);
    }
    debug!("Workspace patterns: {:?}", patterns);

    let mut projects = Vec::new();
    for dir in expand_patterns(root, &patterns)? {
        let manifest = manifests.read_manifest(&dir.join(MANIFEST_FILE))?;
        projects.push(Project { name: manifest.name, path: dir });
    }

    debug!("Found {} workspace projects", projects.len());
    Ok(projects)
}
