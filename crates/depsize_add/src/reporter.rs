use std::io::{self, Write};

use colored::Colorize;
use depsize_core::format_size;

use crate::types::AddOutcome;

pub fn print_add_outcome<W: Write>(writer: &mut W, outcome: &AddOutcome) -> io::Result<()> {
    for stats in &outcome.stats {
        writeln!(
            writer,
            "  {} {} (gzip {})",
            stats.specifier().cyan(),
            format_size(stats.size),
            format_size(stats.gzip)
        )?;
    }

    if outcome.warnings.is_empty() {
        writeln!(writer, "{} Checking constraints completed", "✔".green().bold())?;
    } else {
        writeln!(
            writer,
            "{} Checking constraints completed with {} warnings",
            "⚠".yellow().bold(),
            outcome.warnings.len()
        )?;
    }

    if outcome.installed {
        writeln!(writer, "{} Installed with `{}`", "✔".green().bold(), outcome.command)?;
    } else {
        writeln!(writer, "{} Dry run: {}", "●".blue().bold(), outcome.command.to_string().bold())?;
    }
    writer.flush()
}
