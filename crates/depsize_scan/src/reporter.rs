use std::{
    io::{self, Write},
    sync::Arc,
};

use colored::Colorize;
use depsize_core::{PackageStats, format_size, format_time, time_from_size};
use log::{debug, trace};

use crate::types::{ProjectReport, ScanResult};

const TITLE: &str = "Scan Results";
const HEADERS: [&str; 5] = ["Name", "MIN", "MIN + GZIP", "SLOW 3G", "EMERGING 4G"];

pub(crate) fn stats_row(stats: &PackageStats) -> [String; 5] {
    let time = time_from_size(stats.gzip);
    [
        stats.specifier(),
        format_size(stats.size),
        format_size(stats.gzip),
        format_time(time.three_g),
        format_time(time.four_g),
    ]
}

fn rule(widths: &[usize; 5], left: &str, mid: &str, right: &str) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{}{}{}", left, segments.join(mid), right)
}

fn row_line(widths: &[usize; 5], cells: &[String; 5]) -> String {
    let padded: Vec<String> =
        cells.iter().zip(widths).map(|(cell, w)| format!(" {:<w$} ", cell, w = w)).collect();
    format!("│{}│", padded.join("│"))
}

/// Lay the rows out as a boxed table with a centered title and a header row.
pub(crate) fn render_table(rows: &[[String; 5]]) -> Vec<String> {
    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    // Cell padding plus the inner separators
    let inner = widths.iter().map(|w| w + 2).sum::<usize>() + widths.len() - 1;
    let headers = HEADERS.map(String::from);

    let mut lines = Vec::with_capacity(rows.len() + 6);
    lines.push(format!("┌{}┐", "─".repeat(inner)));
    lines.push(format!("│{:^inner$}│", TITLE, inner = inner));
    lines.push(rule(&widths, "├", "┬", "┤"));
    lines.push(row_line(&widths, &headers));
    lines.push(rule(&widths, "├", "┼", "┤"));
    for row in rows {
        lines.push(row_line(&widths, row));
    }
    lines.push(rule(&widths, "└", "┴", "┘"));
    lines
}

pub fn print_report<W: Write>(writer: &mut W, report: &ProjectReport) -> io::Result<()> {
    debug!("Printing report for {} ({} packages)", report.display_name, report.stats.len());
    writeln!(writer, "{} Project {} completed:", "✔".green().bold(), report.display_name.cyan())?;

    let rows: Vec<[String; 5]> = report.stats.iter().map(|s| stats_row(s)).collect();
    for (idx, line) in render_table(&rows).into_iter().enumerate() {
        trace!("Table line {}: {}", idx, line);
        // Title and header rows sit at lines 1 and 3
        if idx == 1 || idx == 3 {
            writeln!(writer, "{}", line.bold())?;
        } else {
            writeln!(writer, "{}", line)?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

/// Render every project's table, then the skipped projects.
pub fn print_scan_results<W: Write>(writer: &mut W, result: &ScanResult) -> io::Result<()> {
    for report in &result.reports {
        print_report(writer, report)?;
    }
    for name in &result.skipped {
        writeln!(writer, "{} No Packages to scan in project: {}", "⚠".yellow().bold(), name.yellow())?;
    }
    writer.flush()?;
    Ok(())
}

/// Total size of a set of stats, as `(minified, gzipped)`.
pub fn total_sizes(stats: &[Arc<PackageStats>]) -> (u64, u64) {
    stats.iter().fold((0, 0), |(size, gzip), s| (size + s.size, gzip + s.gzip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn stats(name: &str, version: &str, size: u64, gzip: u64) -> Arc<PackageStats> {
        Arc::new(PackageStats {
            name: name.to_string(),
            version: version.to_string(),
            size,
            gzip,
            dependency_count: 0,
            description: None,
            repository: None,
            scoped: false,
            assets: vec![],
            dependency_sizes: vec![],
        })
    }

    #[test]
    fn test_stats_row() {
        let row = stats_row(&stats("react", "18.2.0", 6588, 2567));
        assert_eq!(row[0], "react@18.2.0");
        assert_eq!(row[1], "6.43kB");
        assert_eq!(row[2], "2.51kB");
        assert_eq!(row[3], "50ms");
        assert_eq!(row[4], "3ms");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            stats_row(&stats("react", "18.2.0", 6588, 2567)),
            stats_row(&stats("styled-components", "5.3.6", 1_234_567, 45_000)),
        ];
        let lines = render_table(&rows);

        assert_eq!(lines.len(), 8);
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width), "{:#?}", lines);
        assert!(lines[1].contains("Scan Results"));
        assert!(lines[3].contains("EMERGING 4G"));
        assert!(lines[5].contains("react@18.2.0"));
        assert!(lines[6].contains("styled-components@5.3.6"));
        assert!(lines[6].contains("1.18MB"));
    }

    #[test]
    fn test_render_table_handles_micro_units() {
        let rows = vec![stats_row(&stats("tiny", "1.0.0", 10, 10))];
        let lines = render_table(&rows);
        let width = lines[0].chars().count();
        assert!(lines[5].contains("µs"));
        assert_eq!(lines[5].chars().count(), width);
    }

    #[test]
    fn test_print_report_output() {
        let report = ProjectReport {
            display_name: "packages/bar".to_string(),
            path: PathBuf::from("/repo/packages/bar"),
            stats: vec![stats("dayjs", "1.11.7", 6964, 2926)],
        };
        let mut out = Vec::new();
        print_report(&mut out, &report).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Project"));
        assert!(text.contains("packages/bar"));
        assert!(text.contains("dayjs@1.11.7"));
        assert!(text.contains("6.80kB"));
    }

    #[test]
    fn test_total_sizes() {
        let all = vec![stats("a", "1.0.0", 100, 40), stats("b", "1.0.0", 250, 90)];
        assert_eq!(total_sizes(&all), (350, 130));
    }
}
