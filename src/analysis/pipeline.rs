//! Analysis orchestration: household profile in, ranked complexes out

use crate::analysis::aggregate::{group_by_complex, ComplexAggregate};
use crate::analysis::catalog::Catalog;
use crate::analysis::filter::{
    filter_by_budget, filter_by_build_year, filter_by_min_score, filter_large_complexes,
    min_build_year, DEFAULT_BUDGET_TOLERANCE,
};
use crate::analysis::rank::{rank, RankedResult, DEFAULT_TOP_N};
use crate::analysis::regions::RegionResolver;
use crate::analysis::score::Scorer;
use crate::error::AnalysisError;
use crate::ingestion::enrich::EnrichmentCollector;
use crate::ingestion::sources::Sources;
use crate::ingestion::types::{LawdCode, RawDeal, RentDeal, YearMonth};
use crate::ingestion::utils::trailing_months;
use chrono::{Datelike, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, warn};

/// Optional stages and cut-offs of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub top_n: usize,
    pub budget_tolerance: f64,
    pub large_complexes_only: bool,
    pub min_total_score: Option<i32>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            budget_tolerance: DEFAULT_BUDGET_TOLERANCE,
            large_complexes_only: false,
            min_total_score: None,
        }
    }
}

/// Who is looking: budget in units of 10,000 KRW and where they work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub budget: i64,
    pub workplace: String,
    #[serde(default)]
    pub spouse_workplace: Option<String>,
    #[serde(default)]
    pub options: AnalysisOptions,
}

impl HouseholdProfile {
    pub fn new(budget: i64, workplace: impl Into<String>) -> Self {
        Self {
            budget,
            workplace: workplace.into(),
            spouse_workplace: None,
            options: AnalysisOptions::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.budget <= 0 {
            return Err(AnalysisError::InvalidInput(format!(
                "budget must be positive, got {}",
                self.budget
            )));
        }
        if self.workplace.trim().is_empty() {
            return Err(AnalysisError::InvalidInput("workplace is required".to_string()));
        }
        if self.options.top_n == 0 {
            return Err(AnalysisError::InvalidInput("top_n must be at least 1".to_string()));
        }
        if !(0.0..1.0).contains(&self.options.budget_tolerance) {
            return Err(AnalysisError::InvalidInput(format!(
                "budget tolerance must be in [0, 1), got {}",
                self.options.budget_tolerance
            )));
        }
        Ok(())
    }

    fn spouse(&self) -> Option<&str> {
        self.spouse_workplace
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Complexes enriched and scored at the same time
    pub enrich_concurrency: usize,
    /// Upper bound for each enrichment lookup
    pub lookup_timeout: Duration,
    /// Calendar months of deals merged per region
    pub window_months: usize,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            enrich_concurrency: 8,
            lookup_timeout: Duration::from_secs(10),
            window_months: 3,
        }
    }
}

#[derive(Clone)]
pub struct Analyzer {
    catalog: Catalog,
    sources: Sources,
    settings: AnalyzerSettings,
}

impl Analyzer {
    pub fn new(catalog: Catalog, sources: Sources, settings: AnalyzerSettings) -> Self {
        Self {
            catalog,
            sources,
            settings,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Run one analysis as of `today`
    pub async fn analyze(
        &self,
        profile: &HouseholdProfile,
        today: NaiveDate,
    ) -> Result<Vec<RankedResult>, AnalysisError> {
        profile.validate()?;
        let current_year = today.year();

        // Step 1: regions and their codes
        let regions = self.candidate_regions(profile);
        info!("Searching {} regions: {}", regions.len(), regions.join(", "));
        let codes = self.region_codes(&regions)?;

        // Step 2: trailing window of deals and leases
        let months = trailing_months(today, self.settings.window_months);
        let (deals, rents) = self.fetch_window(&codes, &months).await;
        if deals.is_empty() {
            return Err(AnalysisError::NoTransactions { regions });
        }
        info!("Fetched {} deals and {} leases", deals.len(), rents.len());

        // Step 3: group and filter
        let complexes = group_by_complex(deals);
        info!("Grouped into {} complexes", complexes.len());
        let complexes = self.apply_filters(complexes, profile, current_year)?;
        info!("{} complexes passed filtering", complexes.len());

        // Step 4: enrich and score
        let mut results = self.score_all(complexes, profile, &rents, current_year).await;
        if let Some(min_total) = profile.options.min_total_score {
            results = filter_by_min_score(results, min_total);
        }
        log_score_distribution(&results);

        Ok(rank(results, profile.options.top_n))
    }

    /// Workplace regions, then the spouse's, then the regions between them
    pub fn candidate_regions(&self, profile: &HouseholdProfile) -> Vec<String> {
        let resolver = RegionResolver::new(&self.catalog);
        let mut regions = resolver.resolve_regions(&profile.workplace);

        if let Some(spouse) = profile.spouse() {
            let extra = resolver
                .resolve_regions(spouse)
                .into_iter()
                .chain(resolver.resolve_midpoint_regions(&profile.workplace, spouse));
            for region in extra {
                if !regions.contains(&region) {
                    regions.push(region);
                }
            }
        }

        regions
    }

    /// Distinct codes for the regions; regions without a code are skipped
    fn region_codes(&self, regions: &[String]) -> Result<Vec<LawdCode>, AnalysisError> {
        let resolver = RegionResolver::new(&self.catalog);
        let mut codes: Vec<LawdCode> = Vec::new();

        for region in regions {
            match resolver.region_code(region) {
                Ok(code) if !codes.contains(&code) => codes.push(code),
                Ok(_) => {}
                Err(e) => warn!("Skipping region: {}", e),
            }
        }

        if codes.is_empty() {
            return Err(AnalysisError::RegionNotFound(regions.join(", ")));
        }
        Ok(codes)
    }

    /// Every (code, month) pair; a failed period contributes nothing
    async fn fetch_window(
        &self,
        codes: &[LawdCode],
        months: &[YearMonth],
    ) -> (Vec<RawDeal>, Vec<RentDeal>) {
        let periods: Vec<(LawdCode, YearMonth)> = codes
            .iter()
            .flat_map(|code| months.iter().map(move |month| (code.clone(), *month)))
            .collect();
        let transactions = &self.sources.transactions;

        let fetched: Vec<(Vec<RawDeal>, Vec<RentDeal>)> = stream::iter(periods)
            .map(|(code, month)| async move {
                let (deals, rents) = tokio::join!(
                    transactions.fetch_deals(&code, month),
                    transactions.fetch_rent_deals(&code, month)
                );
                let deals = deals.unwrap_or_else(|e| {
                    warn!("No deals for {} {}: {}", code, month, e);
                    Vec::new()
                });
                let rents = rents.unwrap_or_else(|e| {
                    warn!("No leases for {} {}: {}", code, month, e);
                    Vec::new()
                });
                (deals, rents)
            })
            .buffered(self.settings.enrich_concurrency.max(1))
            .collect()
            .await;

        let mut all_deals = Vec::new();
        let mut all_rents = Vec::new();
        for (deals, rents) in fetched {
            all_deals.extend(deals);
            all_rents.extend(rents);
        }
        (all_deals, all_rents)
    }

    fn apply_filters(
        &self,
        complexes: Vec<ComplexAggregate>,
        profile: &HouseholdProfile,
        current_year: i32,
    ) -> Result<Vec<ComplexAggregate>, AnalysisError> {
        let affordable = filter_by_budget(complexes, profile.budget, profile.options.budget_tolerance);
        if affordable.is_empty() {
            return Err(AnalysisError::OutOfBudget {
                budget: profile.budget,
            });
        }

        let recent = filter_by_build_year(affordable, current_year);
        if recent.is_empty() {
            return Err(AnalysisError::NoRecentBuilds {
                min_build_year: min_build_year(current_year),
            });
        }

        if !profile.options.large_complexes_only {
            return Ok(recent);
        }

        let large = filter_large_complexes(recent);
        if large.is_empty() {
            return Err(AnalysisError::NoLargeComplexes);
        }
        Ok(large)
    }

    /// Enrich and score every complex, keeping input order
    async fn score_all(
        &self,
        complexes: Vec<ComplexAggregate>,
        profile: &HouseholdProfile,
        rents: &[RentDeal],
        current_year: i32,
    ) -> Vec<RankedResult> {
        let collector = EnrichmentCollector::new(
            self.sources.clone(),
            self.catalog,
            self.settings.lookup_timeout,
        );
        let scorer = Scorer::new(&self.catalog, current_year);
        let collector = &collector;

        stream::iter(complexes)
            .map(|complex| async move {
                let bundle = collector.collect(&complex, profile, rents).await;
                let scores = scorer.score(&complex, &bundle);
                RankedResult::new(complex, bundle, scores, current_year)
            })
            .buffered(self.settings.enrich_concurrency.max(1))
            .collect()
            .await
    }
}

/// Spread of total scores; few distinct values mean weak differentiation
pub fn log_score_distribution(results: &[RankedResult]) {
    let totals: BTreeSet<i32> = results.iter().map(|r| r.total_score).collect();
    let (Some(min), Some(max)) = (totals.first(), totals.last()) else {
        return;
    };

    info!(
        "Score distribution: max {}, min {}, {} distinct totals across {} complexes",
        max,
        min,
        totals.len(),
        results.len()
    );
    if totals.len() < 5 {
        warn!("Weak score differentiation: only {} distinct totals", totals.len());
    }
}
