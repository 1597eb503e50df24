use anyhow::Result;
use depsize_core::{BundlephobiaConfig, DepsizeError, PackageStats, format_size};
use log::{trace, warn};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum Measure {
    Size,
    Gzip,
}

impl Measure {
    fn of(&self, stats: &PackageStats) -> u64 {
        match self {
            Measure::Size => stats.size,
            Measure::Gzip => stats.gzip,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    /// Every package on its own
    Package,
    /// The sum over all packages
    Overall,
}

struct Constraint {
    label: &'static str,
    scope: Scope,
    measure: Measure,
    limit: fn(&BundlephobiaConfig) -> Option<u64>,
}

/// Evaluation order; the first violation aborts when warnings are off.
const CONSTRAINTS: [Constraint; 4] = [
    Constraint {
        label: "max-size",
        scope: Scope::Package,
        measure: Measure::Size,
        limit: |c| c.max_size,
    },
    Constraint {
        label: "max-gzip-size",
        scope: Scope::Package,
        measure: Measure::Gzip,
        limit: |c| c.max_gzip_size,
    },
    Constraint {
        label: "total size",
        scope: Scope::Overall,
        measure: Measure::Size,
        limit: |c| c.max_overall_size,
    },
    Constraint {
        label: "total gzip size",
        scope: Scope::Overall,
        measure: Measure::Gzip,
        // The gzip sum is held to max-gzip-size
        limit: |c| c.max_gzip_size,
    },
];

fn describe(stats: &[&PackageStats], measure: Measure) -> String {
    stats
        .iter()
        .map(|s| format!("{}({})", s.specifier(), format_size(measure.of(s))))
        .collect::<Vec<_>>()
        .join(",")
}

/// The violation message, if `stats` exceed `limit` under this constraint.
fn violation(constraint: &Constraint, stats: &[Arc<PackageStats>], limit: u64) -> Option<String> {
    let listed: Vec<&PackageStats> = match constraint.scope {
        Scope::Package => {
            stats.iter().map(|s| s.as_ref()).filter(|s| constraint.measure.of(s) > limit).collect()
        }
        Scope::Overall => {
            let total: u64 = stats.iter().map(|s| constraint.measure.of(s)).sum();
            trace!("Overall {} is {} bytes against {}", constraint.label, total, limit);
            if total <= limit {
                return None;
            }
            stats.iter().map(|s| s.as_ref()).collect()
        }
    };
    if listed.is_empty() {
        return None;
    }

    Some(format!(
        "Can not install {}, Since their {} is larger than the configured({}).",
        describe(&listed, constraint.measure),
        constraint.label,
        format_size(limit)
    ))
}

/// Check fetched stats against the size budget.
///
/// With `warning` set every violation is logged and returned. Otherwise the
/// first violation becomes a [`DepsizeError::BudgetExceeded`] and the
/// remaining constraints are not evaluated.
pub fn check_constraints(
    stats: &[Arc<PackageStats>],
    config: &BundlephobiaConfig,
    warning: bool,
) -> Result<Vec<String>> {
    let mut warnings = Vec::new();
    for constraint in &CONSTRAINTS {
        // Zero counts as unset
        let Some(limit) = (constraint.limit)(config).filter(|&l| l > 0) else {
            continue;
        };
        let Some(hint) = violation(constraint, stats, limit) else {
            continue;
        };
        if !warning {
            return Err(DepsizeError::BudgetExceeded(hint).into());
        }
        warn!("{}", hint);
        warnings.push(hint);
    }
    Ok(warnings)
}
