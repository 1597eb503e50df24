use anyhow::Result;
use clap::Parser;
use log::debug;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Parser)]
pub struct Config {
    /// Packages to scan (defaults to the dependencies in package.json)
    pub packages: Vec<String>,

    /// Select packages to scan
    #[arg(short, long)]
    pub interactive: bool,

    /// Scan packages in every project of the monorepo
    #[arg(short, long)]
    pub recursive: bool,

    /// Project root directory (defaults to the current directory)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Number of projects scanned at once (defaults to the number of CPUs)
    #[arg(long)]
    pub workspace_concurrency: Option<usize>,
}

impl Config {
    /// Absolute directory the scan starts from
    pub fn root(&self) -> Result<PathBuf> {
        depsize_core::resolve_working_dir(self.dir.as_deref())
    }

    pub fn workspace_concurrency(&self) -> usize {
        let n = self.workspace_concurrency.unwrap_or_else(rayon::current_num_threads).max(1);
        debug!("Scanning up to {} projects at once", n);
        n
    }
}
