//! Constants for file names, the size-lookup endpoint and download profiles.
//!
//! This module centralizes the filesystem fingerprints used to recognise a
//! project root and its package manager, so that root discovery and package
//! manager detection always agree on what a lockfile looks like.
//!
//! ## Lockfiles
//!
//! - **pnpm**: `pnpm-lock.yaml`, plus `pnpm-workspace.yaml` for workspaces
//! - **npm**: `package-lock.json`
//! - **yarn**: `yarn.lock`

/// Manifest file name of every npm project
pub const MANIFEST_FILE: &str = "package.json";

pub const PNPM_LOCKFILE: &str = "pnpm-lock.yaml";
pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";
pub const NPM_LOCKFILE: &str = "package-lock.json";
pub const YARN_LOCKFILE: &str = "yarn.lock";

/// Files whose presence marks a directory as a project root
pub const ROOT_MARKERS: &[&str] = &[
    PNPM_LOCKFILE,       // pnpm
    PNPM_WORKSPACE_FILE, // pnpm workspace
    NPM_LOCKFILE,        // npm
    YARN_LOCKFILE,       // yarn
];

/// Key of the size budget block inside the root manifest
pub const CONFIG_KEY: &str = "bundle-phobia";

/// Directory holding installed packages
pub const NODE_MODULES: &str = "node_modules";

pub const BUNDLEPHOBIA_API: &str = "https://bundlephobia.com/api/size";
pub const USER_AGENT: &str = "bundle-phobia-cli";

/// Version queried when neither an installed nor a declared version is known
pub const LATEST: &str = "latest";

/// Concurrent lookups allowed on the add path
pub const ADD_CONCURRENCY: usize = 6;

/// Bandwidth of the "slow 3G" profile in kbit/s
pub const SLOW_3G_KBITS: f64 = 400.0;
/// Bandwidth of the "emerging 4G" profile in kbit/s
pub const EMERGING_4G_KBITS: f64 = 7000.0;
