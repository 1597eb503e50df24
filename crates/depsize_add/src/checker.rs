use anyhow::Result;
use depsize_core::{ManifestCache, Progress, StatsFetcher, find_root_directory};
use log::{debug, info};

use crate::{
    config::Config, constraints::check_constraints, installer::InstallCommand, types::AddOutcome,
};

/// Fetch stats for the requested packages, enforce the size budget of the
/// enclosing project root, then hand the packages to its package manager.
pub fn run_add(cfg: &Config, fetcher: &StatsFetcher) -> Result<AddOutcome> {
    add_with_installer(cfg, fetcher, InstallCommand::run)
}

/// `run_add` with the installer step supplied by the caller.
pub(crate) fn add_with_installer(
    cfg: &Config,
    fetcher: &StatsFetcher,
    install: impl FnOnce(&InstallCommand) -> Result<()>,
) -> Result<AddOutcome> {
    info!("Starting add");
    let cwd = cfg.cwd()?;
    let root = find_root_directory(&cwd, &cwd);
    debug!("Project root for {} is {}", cwd.display(), root.display());

    let budget = ManifestCache::new().get_config(&root)?;
    debug!("Size budget: {:?}", budget);

    let progress = Progress::stderr();
    let spinner = progress.spinner("Checking constraints");
    let packages = cfg.specifiers();
    let stats = fetcher.request_stats(&packages)?;
    let warnings = check_constraints(&stats, &budget, cfg.warning)?;
    // The installer takes over the terminal next
    spinner.finish_and_clear();

    let command = InstallCommand::detect(&packages, &cwd, &root);
    if cfg.dry_run {
        info!("Dry run, skipping `{}`", command);
    } else {
        install(&command)?;
    }

    Ok(AddOutcome { stats, warnings, command, installed: !cfg.dry_run })
}
