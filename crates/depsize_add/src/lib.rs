//! Budget-checked installs for npm projects.
//!
//! `run_add` fetches the size stats of the requested packages, compares them
//! with the `bundle-phobia` budget in the root `package.json` and, when the
//! budget allows it, runs the detected package manager's add command.

mod checker;
mod config;
mod constraints;
mod installer;
mod reporter;
mod types;

// Re-export public API
pub use checker::run_add;
pub use config::Config;
pub use constraints::check_constraints;
pub use installer::InstallCommand;
pub use reporter::print_add_outcome;
pub use types::AddOutcome;
