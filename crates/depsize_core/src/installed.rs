use log::{trace, warn};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{MANIFEST_FILE, NODE_MODULES};

#[derive(Deserialize)]
struct InstalledManifest {
    version: Option<String>,
}

/// Find `node_modules/<name>/package.json` visible from `dir`, walking up the
/// ancestors the way Node resolves bare imports.
fn locate_installed_manifest(name: &str, dir: &Path) -> Option<PathBuf> {
    let mut current_dir = Some(dir);
    while let Some(d) = current_dir {
        let candidate = d.join(NODE_MODULES).join(name).join(MANIFEST_FILE);
        trace!("Checking installed manifest at: {}", candidate.display());
        if candidate.is_file() {
            return Some(candidate);
        }
        current_dir = d.parent();
    }
    None
}

/// Version of `name` installed in the dependency tree visible from `dir`.
///
/// Symlinked layouts (pnpm) are followed transparently. A missing or
/// unreadable package logs a warning and returns `None`.
pub fn installed_version(name: &str, dir: &Path) -> Option<String> {
    let version = locate_installed_manifest(name, dir)
        .and_then(|p| fs::read_to_string(p).ok())
        .and_then(|txt| serde_json::from_str::<InstalledManifest>(&txt).ok())
        .and_then(|m| m.version);

    if version.is_none() {
        warn!(
            "Can not get installed version of package {}, use version listed in package.json or latest instead",
            name
        );
    }
    version
}
