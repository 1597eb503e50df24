//! Core utilities for depsize tools.
//!
//! This crate provides shared functionality for measuring the bundle-size cost
//! of npm dependencies, including:
//! - Locating the project root and workspace members
//! - Reading `package.json` manifests and the size budget configuration
//! - Resolving installed versions from `node_modules`
//! - Fetching package stats with bounded concurrency and memoization
//! - Formatting sizes and download times
//! - Progress spinners for long-running requests

mod constants;
mod error;
mod format;
mod installed;
mod manifest;
mod progress;
mod stats;
mod types;
mod workspace;

// Re-export public API
pub use constants::{ADD_CONCURRENCY, LATEST, MANIFEST_FILE};
pub use error::DepsizeError;
pub use format::{DownloadTime, format_size, format_time, time_from_size};
pub use installed::installed_version;
pub use manifest::{BundlephobiaConfig, Manifest, ManifestCache, Workspaces};
pub use progress::Progress;
pub use stats::{BundlephobiaClient, StatsFetcher, StatsSource};
pub use types::{
    Asset, DependencyMap, DependencySize, PackageManager, PackageStats, Project, split_specifier,
};
pub use workspace::{
    detect_package_manager, find_root_directory, find_workspace_projects, resolve_working_dir,
};
