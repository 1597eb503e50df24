use std::path::PathBuf;

use thiserror::Error;

/// Errors with a dedicated user-facing message.
///
/// Operations return `anyhow::Result`; these travel inside `anyhow::Error` and
/// are recovered at the CLI boundary with `downcast_ref`.
#[derive(Debug, Error)]
pub enum DepsizeError {
    #[error("JSON parse failed. file: {}", file.display())]
    ParseJson { file: PathBuf },

    #[error("Request {specifier} failed.\n         code: {code}.\n         message: {message}")]
    RequestStats { specifier: String, code: String, message: String },

    #[error(
        "No Packages to scan, the packages to be scanned can be specified in the following way:\n\
         1. dependencies in package.json 2. set packages manually, e.g. depsize react react-dom"
    )]
    NoPackages,

    #[error("Can not use --recursive(-r) and packages --interactive(-i) at the same time")]
    RecursiveWithInteractive,

    #[error("{0}")]
    BudgetExceeded(String),

    #[error("{manager} exited with {status}")]
    InstallFailed { manager: String, status: String },
}
