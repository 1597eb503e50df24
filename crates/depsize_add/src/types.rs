use std::sync::Arc;

use depsize_core::PackageStats;

use crate::installer::InstallCommand;

/// What an add run checked and what it did about it.
#[derive(Debug, Clone)]
pub struct AddOutcome {
    pub stats: Vec<Arc<PackageStats>>,
    /// Budget violations that were logged instead of aborting
    pub warnings: Vec<String>,
    pub command: InstallCommand,
    /// False for a dry run
    pub installed: bool,
}
