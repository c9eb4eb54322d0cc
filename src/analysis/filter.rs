//! Filter pipeline - independently composable narrowing stages

use crate::analysis::aggregate::ComplexAggregate;
use crate::analysis::rank::RankedResult;
use tracing::info;

/// Relative width of the primary budget window
pub const DEFAULT_BUDGET_TOLERANCE: f64 = 0.1;

/// Oldest accepted complex, in years
pub const MAX_BUILDING_AGE: i32 = 20;

/// Deal volume treated as a proxy for a complex of 500+ units
pub const LARGE_COMPLEX_MIN_DEALS: usize = 5;

/// Keep complexes priced within `budget × [1 - tolerance, 1 + tolerance]`.
///
/// When nothing falls inside the window, widens to every complex priced at
/// or below the budget. Applying the filter to its own output is a no-op.
pub fn filter_by_budget(
    complexes: Vec<ComplexAggregate>,
    budget: i64,
    tolerance: f64,
) -> Vec<ComplexAggregate> {
    let (lower, upper) = budget_window(budget, tolerance);

    let in_window = |c: &ComplexAggregate| (lower..=upper).contains(&c.avg_price);

    if complexes.iter().any(in_window) {
        let kept: Vec<_> = complexes.into_iter().filter(|c| in_window(c)).collect();
        info!("Budget window {}..={} kept {} complexes", lower, upper, kept.len());
        return kept;
    }

    let kept: Vec<_> = complexes
        .into_iter()
        .filter(|c| c.avg_price <= budget)
        .collect();
    info!(
        "Budget window {}..={} empty, widened to <= {}: {} complexes",
        lower,
        upper,
        budget,
        kept.len()
    );
    kept
}

/// Integer prices inside `budget × [1 - tolerance, 1 + tolerance]`.
/// Fractional bounds round inward.
pub fn budget_window(budget: i64, tolerance: f64) -> (i64, i64) {
    let lower = budget as f64 * (1.0 - tolerance);
    let upper = budget as f64 * (1.0 + tolerance);
    (
        (lower - window_slack(lower)).ceil() as i64,
        (upper + window_slack(upper)).floor() as i64,
    )
}

/// Relative slack absorbing f64 error in `budget × (1 ± tolerance)`
const WINDOW_EPSILON: f64 = 1e-12;

fn window_slack(bound: f64) -> f64 {
    WINDOW_EPSILON * bound.abs().max(1.0)
}

/// Build year as a number, if it is one
pub fn parse_build_year(build_year: &str) -> Option<i32> {
    build_year.trim().parse::<i32>().ok()
}

/// Keep complexes built no earlier than `current_year - MAX_BUILDING_AGE`.
/// Complexes whose build year is not numeric are dropped.
pub fn filter_by_build_year(complexes: Vec<ComplexAggregate>, current_year: i32) -> Vec<ComplexAggregate> {
    let min_year = min_build_year(current_year);
    complexes
        .into_iter()
        .filter(|c| parse_build_year(&c.build_year).map_or(false, |year| year >= min_year))
        .collect()
}

pub fn min_build_year(current_year: i32) -> i32 {
    current_year - MAX_BUILDING_AGE
}

pub fn filter_large_complexes(complexes: Vec<ComplexAggregate>) -> Vec<ComplexAggregate> {
    complexes
        .into_iter()
        .filter(|c| c.transaction_count >= LARGE_COMPLEX_MIN_DEALS)
        .collect()
}

pub fn filter_by_min_score(results: Vec<RankedResult>, min_total: i32) -> Vec<RankedResult> {
    results
        .into_iter()
        .filter(|r| r.total_score >= min_total)
        .collect()
}
