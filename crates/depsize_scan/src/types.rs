use anyhow::Error;
use depsize_core::PackageStats;
use std::{path::PathBuf, sync::Arc};

/// Stats fetched for one project, in the order packages were requested.
#[derive(Debug, Clone)]
pub struct ProjectReport {
    /// Path relative to the scan root, `./` for the root itself
    pub display_name: String,
    pub path: PathBuf,
    pub stats: Vec<Arc<PackageStats>>,
}

/// A project whose scan did not complete.
#[derive(Debug)]
pub struct ProjectFailure {
    pub display_name: String,
    pub error: Error,
}

#[derive(Debug, Default)]
pub struct ScanResult {
    pub reports: Vec<ProjectReport>,
    pub failures: Vec<ProjectFailure>,
    /// Projects skipped because they had nothing to scan
    pub skipped: Vec<String>,
}

impl ScanResult {
    pub fn packages_scanned(&self) -> usize {
        self.reports.iter().map(|r| r.stats.len()).sum()
    }

    /// The first failed project's error, in project order.
    pub fn into_first_failure(self) -> Option<Error> {
        self.failures.into_iter().next().map(|f| f.error)
    }
}
