//! Bundle-size scanning for the dependencies of npm projects.
//!
//! This crate resolves which package versions a project (or every project of
//! a monorepo) depends on, fetches their size stats and renders one table per
//! project.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use depsize_core::{BundlephobiaClient, StatsFetcher};
//! use depsize_scan::{Config, PromptSelector, print_scan_results, run_scan};
//! use std::io::{self, BufWriter};
//!
//! # fn main() -> anyhow::Result<()> {
//! let cfg = Config { recursive: true, ..Default::default() };
//! let fetcher = StatsFetcher::new(Box::new(BundlephobiaClient::new()), 4)?;
//! let mut selector = PromptSelector::new(io::stdin().lock(), io::stderr());
//!
//! let result = run_scan(&cfg, &fetcher, &mut selector)?;
//!
//! let mut stdout = BufWriter::new(io::stdout());
//! print_scan_results(&mut stdout, &result)?;
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
mod reporter;
mod select;
mod types;

// Re-export public API
pub use checker::run_scan;
pub use config::Config;
pub use reporter::{print_report, print_scan_results, total_sizes};
pub use select::{PackageSelector, PromptSelector};
pub use types::{ProjectFailure, ProjectReport, ScanResult};
