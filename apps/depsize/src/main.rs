use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use depsize_core::{ADD_CONCURRENCY, BundlephobiaClient, DepsizeError, StatsFetcher};
use depsize_scan::PromptSelector;
use env_logger::Env;
use log::{debug, info};
use std::env;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "depsize")]
#[command(about = "Know the bundle-size cost of your npm dependencies", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scan: depsize_scan::Config,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check the size budget, then install packages with the project's package manager
    Add(depsize_add::Config),
}

fn scan(cfg: depsize_scan::Config, stdout: &mut impl Write) -> Result<()> {
    let start = Instant::now();
    let num_threads = rayon::current_num_threads();
    info!("Running scan (using {} threads)", num_threads);
    debug!("Config: {:?}", cfg);

    let fetcher = StatsFetcher::new(Box::new(BundlephobiaClient::new()), num_threads)?;
    let mut selector = PromptSelector::new(io::stdin().lock(), io::stderr());
    let result = depsize_scan::run_scan(&cfg, &fetcher, &mut selector)?;
    debug!("Scanned {} packages", result.packages_scanned());

    depsize_scan::print_scan_results(stdout, &result)?;

    let all: Vec<_> = result.reports.iter().flat_map(|r| r.stats.iter().cloned()).collect();
    let (size, gzip) = depsize_scan::total_sizes(&all);
    writeln!(
        stdout,
        "{} Finished in {}ms on {} projects, {} packages ({} minified, {} gzipped).",
        "●".bright_blue(),
        start.elapsed().as_millis().to_string().cyan(),
        result.reports.len().to_string().cyan(),
        result.packages_scanned().to_string().cyan(),
        depsize_core::format_size(size).cyan(),
        depsize_core::format_size(gzip).cyan()
    )?;
    stdout.flush()?;

    match result.into_first_failure() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn add(cfg: depsize_add::Config, stdout: &mut impl Write) -> Result<()> {
    info!("Running add for {:?}", cfg.packages);
    let fetcher = StatsFetcher::new(Box::new(BundlephobiaClient::new()), ADD_CONCURRENCY)?;
    let outcome = depsize_add::run_add(&cfg, &fetcher)?;
    depsize_add::print_add_outcome(stdout, &outcome)?;
    Ok(())
}

fn run() -> Result<()> {
    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    match cli.command {
        Some(Commands::Add(cfg)) => add(cfg, &mut stdout),
        None => scan(cli.scan, &mut stdout),
    }
}

/// Known errors print their message, anything else its full chain. The stack
/// follows when `with_stack` is set.
fn render_error(err: &anyhow::Error, with_stack: bool) -> String {
    let mut out = match err.downcast_ref::<DepsizeError>() {
        Some(known) => format!("{} {}", "Error:".red().bold(), known),
        None => format!("{} {:?}", "Error:".red().bold(), err),
    };
    if with_stack {
        out.push_str(&format!("\n\nStack backtrace:\n{}", err.backtrace()));
    }
    out
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    if let Err(err) = run() {
        eprintln!("{}", render_error(&err, env::var_os("RUST_BACKTRACE").is_some()));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_known_error() {
        colored::control::set_override(false);
        let err = anyhow::Error::from(DepsizeError::NoPackages);
        let text = render_error(&err, false);
        assert!(text.starts_with("Error: No Packages to scan"), "{}", text);
        assert!(!text.contains("Stack backtrace"));
    }

    #[test]
    fn test_render_with_stack() {
        colored::control::set_override(false);
        let err = anyhow::Error::from(DepsizeError::RecursiveWithInteractive);
        let text = render_error(&err, true);
        assert!(text.starts_with("Error: Can not use --recursive(-r)"), "{}", text);
        assert!(text.contains("Stack backtrace:"));
    }

    #[test]
    fn test_render_unknown_error_chain() {
        colored::control::set_override(false);
        let err = anyhow::anyhow!("disk on fire").context("failed to read manifest");
        let text = render_error(&err, false);
        assert!(text.contains("failed to read manifest"));
        assert!(text.contains("disk on fire"));
    }
}
