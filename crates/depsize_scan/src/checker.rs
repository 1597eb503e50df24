use anyhow::{Context, Error, Result};
use depsize_core::{
    DependencyMap, DepsizeError, LATEST, MANIFEST_FILE, ManifestCache, PackageStats, Progress,
    Project, StatsFetcher, find_workspace_projects, installed_version, split_specifier,
};
use log::{debug, info, trace, warn};
use rayon::{ThreadPoolBuilder, prelude::*};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

use crate::{
    config::Config,
    select::PackageSelector,
    types::{ProjectFailure, ProjectReport, ScanResult},
};

enum Outcome {
    Skipped,
    Failed(Error),
    Scanned(Vec<Arc<PackageStats>>),
}

fn display_name(root: &Path, project_dir: &Path) -> String {
    match project_dir.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => "./".to_string(),
        Ok(rel) => rel.to_string_lossy().to_string(),
        Err(_) => project_dir.to_string_lossy().to_string(),
    }
}

/// The specifier to query for `package`: its explicit version if it carries
/// one, else the installed version, else the declared range, else `latest`.
pub(crate) fn resolve_specifier(package: &str, deps: &DependencyMap, project_dir: &Path) -> String {
    let package = package.trim();
    if let (_, Some(_)) = split_specifier(package) {
        return package.to_string();
    }

    let version = installed_version(package, project_dir)
        .or_else(|| deps.get(package).cloned())
        .unwrap_or_else(|| LATEST.to_string());
    trace!("Resolved {} to version {}", package, version);
    format!("{}@{}", package, version)
}

fn plan_project(
    cfg: &Config,
    project: &Project,
    display: &str,
    projects: &[Project],
    manifests: &ManifestCache,
    selector: &mut dyn PackageSelector,
) -> Result<Vec<String>> {
    let deps = manifests.get_dependencies(&project.path.join(MANIFEST_FILE), projects)?;

    let mut packages: Vec<String> =
        if cfg.packages.is_empty() { deps.keys().cloned().collect() } else { cfg.packages.clone() };

    if cfg.interactive {
        packages = selector.select(display, &packages)?;
    }

    Ok(packages.iter().map(|p| resolve_specifier(p, &deps, &project.path)).collect())
}

pub fn run_scan(
    cfg: &Config,
    fetcher: &StatsFetcher,
    selector: &mut dyn PackageSelector,
) -> Result<ScanResult> {
    info!("Starting scan");
    if cfg.recursive && cfg.interactive {
        return Err(DepsizeError::RecursiveWithInteractive.into());
    }

    let root = cfg.root()?;
    let manifests = ManifestCache::new();

    let mut projects = vec![Project { name: Some(".".to_string()), path: root.clone() }];
    if cfg.recursive {
        debug!("Searching workspace projects under {}", root.display());
        projects.extend(find_workspace_projects(&root, &manifests)?);
    }
    info!("Scanning {} projects", projects.len());

    // Plans are made in order on this thread so prompts never interleave
    let plans: Vec<(String, PathBuf, Result<Vec<String>>)> = projects
        .iter()
        .map(|project| {
            let display = display_name(&root, &project.path);
            let plan = plan_project(cfg, project, &display, &projects, &manifests, selector);
            (display, project.path.clone(), plan)
        })
        .collect();

    let pool = ThreadPoolBuilder::new()
        .num_threads(cfg.workspace_concurrency())
        .build()
        .context("Failed to build project worker pool")?;
    let progress = Progress::stderr();

    let outcomes: Vec<(String, PathBuf, Outcome)> = pool.install(|| {
        plans
            .into_par_iter()
            .map(|(display, path, plan)| {
                let outcome = match plan {
                    Ok(specs) if specs.is_empty() => Outcome::Skipped,
                    Ok(specs) => {
                        debug!("Thread {:?} scanning project {}", thread::current().id(), display);
                        let spinner = progress.spinner(format!("Scanning project {}", display));
                        let outcome = match fetcher.request_stats(&specs) {
                            Ok(stats) => Outcome::Scanned(stats),
                            Err(e) => Outcome::Failed(e),
                        };
                        spinner.finish_and_clear();
                        outcome
                    }
                    Err(e) => Outcome::Failed(e),
                };
                (display, path, outcome)
            })
            .collect()
    });

    let mut result = ScanResult::default();
    for (display_name, path, outcome) in outcomes {
        match outcome {
            Outcome::Skipped => {
                warn!("No Packages to scan in project: {}", path.display());
                result.skipped.push(display_name);
            }
            Outcome::Failed(error) => {
                warn!("Project {} failed: {}", display_name, error);
                result.failures.push(ProjectFailure { display_name, error });
            }
            Outcome::Scanned(stats) => {
                info!("Project {} completed with {} packages", display_name, stats.len());
                result.reports.push(ProjectReport { display_name, path, stats });
            }
        }
    }

    if result.reports.is_empty() && result.failures.is_empty() {
        return Err(DepsizeError::NoPackages.into());
    }

    info!(
        "Scan complete: {} reports, {} failures, {} skipped",
        result.reports.len(),
        result.failures.len(),
        result.skipped.len()
    );
    debug!(
        "Cache statistics: stats={}, manifests={}",
        fetcher.cached_len(),
        manifests.len()
    );
    Ok(result)
}
