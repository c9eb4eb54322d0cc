//! One-shot analysis run - ranks complexes for a household and optionally
//! exports the ranking as CSV
//!
//! Usage: apt-analyze <budget> <workplace> [spouse-workplace]
//!                    [--top N] [--large-only] [--min-score N] [--csv PATH]

use anyhow::{bail, Context, Result};
use apt_invest::analysis::{HouseholdProfile, RankedResult};
use apt_invest::config::{init_tracing, Config};
use apt_invest::ingestion::cache::ResponseCache;
use chrono::Local;
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    let args: Vec<String> = env::args().skip(1).collect();
    let (profile, csv_path) = parse_args(&args)?;
    info!(
        "Analyzing budget {} for workplace {} (spouse: {:?})",
        profile.budget, profile.workplace, profile.spouse_workplace
    );

    let cache = Arc::new(ResponseCache::new(config.cache_ttl));
    let analyzer = config.analyzer(cache)?;
    let results = analyzer.analyze(&profile, Local::now().date_naive()).await?;

    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result);
    }

    if let Some(path) = csv_path {
        write_csv(&path, &results)?;
        info!("✓ Wrote {} rows to {}", results.len(), path.display());
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<(HouseholdProfile, Option<PathBuf>)> {
    let mut positional: Vec<&str> = Vec::new();
    let mut csv_path = None;
    let mut top_n = None;
    let mut min_score = None;
    let mut large_only = false;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--csv" => csv_path = Some(PathBuf::from(flag_value(&mut iter, "--csv")?)),
            "--top" => {
                let value = flag_value(&mut iter, "--top")?;
                top_n = Some(value.parse().context("--top expects a number")?);
            }
            "--min-score" => {
                let value = flag_value(&mut iter, "--min-score")?;
                min_score = Some(value.parse().context("--min-score expects a number")?);
            }
            "--large-only" => large_only = true,
            other => positional.push(other),
        }
    }

    let (budget, workplace, spouse) = match positional.as_slice() {
        [budget, workplace] => (budget, workplace, None),
        [budget, workplace, spouse] => (budget, workplace, Some(spouse.to_string())),
        _ => bail!("usage: apt-analyze <budget> <workplace> [spouse-workplace] [--top N] [--large-only] [--min-score N] [--csv PATH]"),
    };

    let mut profile = HouseholdProfile::new(
        budget.parse().context("budget must be a number in units of 10,000 KRW")?,
        *workplace,
    );
    profile.spouse_workplace = spouse;
    profile.options.large_complexes_only = large_only;
    profile.options.min_total_score = min_score;
    if let Some(top_n) = top_n {
        profile.options.top_n = top_n;
    }

    Ok((profile, csv_path))
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str> {
    match iter.next() {
        Some(value) => Ok(value.as_str()),
        None => bail!("{} requires a value", flag),
    }
}

fn print_result(position: usize, result: &RankedResult) {
    let c = &result.complex;
    println!(
        "{:>2}. {} ({}, {}) - {} points [{}]",
        position,
        c.name,
        c.dong,
        c.build_year,
        result.total_score,
        result.verdict.label()
    );
    println!(
        "    avg {} | {} deals | {}",
        c.avg_price, c.transaction_count, result.narrative
    );
}

#[derive(Serialize)]
struct CsvRow<'a> {
    rank: usize,
    name: &'a str,
    dong: &'a str,
    build_year: &'a str,
    avg_price: i64,
    avg_area: f64,
    transaction_count: usize,
    total_score: i32,
    verdict: &'static str,
    location: i32,
    household: i32,
    brand: i32,
    supply: i32,
    education: i32,
    age: i32,
    market: i32,
    psychology: i32,
    jeonse_ratio: Option<f64>,
    narrative: &'a str,
}

fn write_csv(path: &Path, results: &[RankedResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for (i, r) in results.iter().enumerate() {
        writer.serialize(CsvRow {
            rank: i + 1,
            name: &r.complex.name,
            dong: &r.complex.dong,
            build_year: &r.complex.build_year,
            avg_price: r.complex.avg_price,
            avg_area: r.complex.avg_area,
            transaction_count: r.complex.transaction_count,
            total_score: r.total_score,
            verdict: r.verdict.label(),
            location: r.scores.location,
            household: r.scores.household,
            brand: r.scores.brand,
            supply: r.scores.supply,
            education: r.scores.education,
            age: r.scores.age,
            market: r.scores.market,
            psychology: r.scores.psychology,
            jeonse_ratio: r.scores.jeonse_ratio,
            narrative: &r.narrative,
        })?;
    }

    writer.flush()?;
    Ok(())
}
