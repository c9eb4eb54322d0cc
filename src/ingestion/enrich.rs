//! Enrichment collector - gathers auxiliary signals for one complex
//!
//! Each lookup is independent, bounded by a timeout and fail-soft: a failed
//! or slow lookup is logged and replaced by its neutral default, so
//! `collect` itself never fails.

use crate::analysis::aggregate::ComplexAggregate;
use crate::analysis::catalog::Catalog;
use crate::analysis::pipeline::HouseholdProfile;
use crate::ingestion::sources::Sources;
use crate::ingestion::types::{EnrichmentBundle, Lookup, RentDeal, DEFAULT_COMMUTE_MINUTES};
use crate::ingestion::utils::format_address;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Relative floor-area difference for a lease to count as the same unit type
pub const RENT_AREA_TOLERANCE: f64 = 0.10;

#[derive(Clone)]
pub struct EnrichmentCollector {
    sources: Sources,
    catalog: Catalog,
    timeout: Duration,
}

impl EnrichmentCollector {
    pub fn new(sources: Sources, catalog: Catalog, timeout: Duration) -> Self {
        Self {
            sources,
            catalog,
            timeout,
        }
    }

    pub async fn collect(
        &self,
        complex: &ComplexAggregate,
        household: &HouseholdProfile,
        all_rents: &[RentDeal],
    ) -> EnrichmentBundle {
        let province = self.catalog.province_for(&complex.lawd_code);
        let address = format_address(province, &complex.dong, &complex.jibun);

        let (transit_distance, unsold, construction, commute_minutes) = tokio::join!(
            self.bounded(
                "transit",
                &complex.name,
                self.sources.transit.fetch_nearest_transit(&address),
                Lookup::NotFound,
            ),
            self.bounded(
                "unsold",
                &complex.name,
                self.sources.unsold.fetch_unsold(province),
                Lookup::NotFound,
            ),
            self.bounded(
                "construction",
                &complex.name,
                self.sources.construction.fetch_construction(province),
                Lookup::NotFound,
            ),
            self.bounded(
                "commute",
                &complex.name,
                self.sources
                    .transit
                    .fetch_commute_minutes(&address, &household.workplace),
                DEFAULT_COMMUTE_MINUTES,
            ),
        );

        let matching_rents = matching_rents(complex, all_rents);
        debug!(
            "Enriched {}: transit={:?} unsold={:?} construction={:?} commute={}min leases={}",
            complex.name,
            transit_distance,
            unsold,
            construction,
            commute_minutes,
            matching_rents.len()
        );

        EnrichmentBundle {
            transit_distance,
            unsold,
            construction,
            commute_minutes,
            matching_rents,
        }
    }

    async fn bounded<T>(
        &self,
        lookup: &str,
        complex: &str,
        request: impl Future<Output = Result<T>>,
        default: T,
    ) -> T {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!("{} lookup failed for {}, using default: {}", lookup, complex, e);
                default
            }
            Err(_) => {
                warn!(
                    "{} lookup for {} timed out after {:?}, using default",
                    lookup, complex, self.timeout
                );
                default
            }
        }
    }
}

/// Deposit-only leases of the same complex and a comparable floor area
pub fn matching_rents(complex: &ComplexAggregate, all_rents: &[RentDeal]) -> Vec<RentDeal> {
    if complex.avg_area <= 0.0 {
        return Vec::new();
    }

    all_rents
        .iter()
        .filter(|rent| rent.apt_name == complex.name)
        .filter(|rent| rent.is_jeonse())
        .filter(|rent| (rent.area - complex.avg_area).abs() / complex.avg_area <= RENT_AREA_TOLERANCE)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::pipeline::AnalysisOptions;
    use crate::ingestion::sources::{
        ConstructionSource, TransactionSource, TransitSource, UnsoldSource,
    };
    use crate::ingestion::types::{LawdCode, RawDeal, YearMonth};
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records lookup arguments; fails or stalls on request
    #[derive(Default)]
    struct Stub {
        fail: bool,
        stall: bool,
        seen: Mutex<Vec<String>>,
    }

    impl Stub {
        async fn respond<T>(&self, arg: &str, value: T) -> Result<T> {
            self.seen.lock().unwrap().push(arg.to_string());
            if self.stall {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            if self.fail {
                bail!("upstream unavailable");
            }
            Ok(value)
        }
    }

    #[async_trait]
    impl TransactionSource for Stub {
        async fn fetch_deals(&self, _: &LawdCode, _: YearMonth) -> Result<Vec<RawDeal>> {
            Ok(Vec::new())
        }

        async fn fetch_rent_deals(&self, _: &LawdCode, _: YearMonth) -> Result<Vec<RentDeal>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl UnsoldSource for Stub {
        async fn fetch_unsold(&self, region: &str) -> Result<Lookup<u32>> {
            self.respond(region, Lookup::Found(0)).await
        }
    }

    #[async_trait]
    impl ConstructionSource for Stub {
        async fn fetch_construction(&self, region: &str) -> Result<Lookup<u32>> {
            self.respond(region, Lookup::Found(1200)).await
        }
    }

    #[async_trait]
    impl TransitSource for Stub {
        async fn fetch_nearest_transit(&self, address: &str) -> Result<Lookup<u32>> {
            self.respond(address, Lookup::Found(420)).await
        }

        async fn fetch_commute_minutes(&self, from: &str, to: &str) -> Result<u32> {
            self.respond(&format!("{from} -> {to}"), 25).await
        }
    }

    fn collector(stub: Arc<Stub>) -> EnrichmentCollector {
        let sources = Sources {
            transactions: stub.clone(),
            unsold: stub.clone(),
            construction: stub.clone(),
            transit: stub,
        };
        EnrichmentCollector::new(sources, Catalog::standard(), Duration::from_millis(200))
    }

    fn complex(name: &str, area: f64, lawd_code: &str) -> ComplexAggregate {
        ComplexAggregate::new(RawDeal {
            apt_name: name.to_string(),
            dong: "정자동".to_string(),
            jibun: "178".to_string(),
            build_year: "2012".to_string(),
            deal_amount: 150_000,
            area,
            floor: 12,
            deal_year: "2026".to_string(),
            deal_month: "9".to_string(),
            deal_day: "2".to_string(),
            lawd_code: lawd_code.to_string(),
        })
    }

    fn lease(name: &str, area: f64, deposit: i64, monthly_rent: i64) -> RentDeal {
        RentDeal {
            apt_name: name.to_string(),
            dong: "정자동".to_string(),
            deposit,
            monthly_rent,
            area,
            build_year: "2012".to_string(),
            contract_year: "2026".to_string(),
            contract_month: "9".to_string(),
            contract_day: "9".to_string(),
        }
    }

    fn household() -> HouseholdProfile {
        HouseholdProfile {
            budget: 150_000,
            workplace: "판교".to_string(),
            spouse_workplace: None,
            options: AnalysisOptions::default(),
        }
    }

    #[test]
    fn test_matching_rents_requires_name_area_and_jeonse() {
        let c = complex("느티마을", 84.0, "41135");
        let rents = vec![
            lease("느티마을", 84.9, 100_000, 0),
            lease("느티마을", 80.0, 95_000, 0),
            lease("느티마을", 84.0, 30_000, 120),
            lease("느티마을", 59.9, 70_000, 0),
            lease("상록마을", 84.0, 100_000, 0),
        ];

        let matched = matching_rents(&c, &rents);
        let deposits: Vec<i64> = matched.iter().map(|r| r.deposit).collect();
        assert_eq!(deposits, vec![100_000, 95_000]);
    }

    #[tokio::test]
    async fn test_collect_uses_province_and_address() {
        let stub = Arc::new(Stub::default());
        let bundle = collector(stub.clone())
            .collect(&complex("느티마을", 84.0, "41135"), &household(), &[])
            .await;

        assert_eq!(bundle.transit_distance, Lookup::Found(420));
        assert_eq!(bundle.unsold, Lookup::Found(0));
        assert_eq!(bundle.construction, Lookup::Found(1200));
        assert_eq!(bundle.commute_minutes, 25);

        let seen = stub.seen.lock().unwrap().clone();
        assert!(seen.contains(&"경기 정자동 178".to_string()));
        assert!(seen.contains(&"경기".to_string()));
        assert!(seen.contains(&"경기 정자동 178 -> 판교".to_string()));
    }

    #[tokio::test]
    async fn test_failed_lookups_fall_back_to_defaults() {
        let stub = Arc::new(Stub {
            fail: true,
            ..Stub::default()
        });
        let bundle = collector(stub)
            .collect(&complex("느티마을", 84.0, "41135"), &household(), &[])
            .await;

        assert_eq!(bundle, EnrichmentBundle::default());
    }

    #[tokio::test]
    async fn test_slow_lookups_time_out_to_defaults() {
        let stub = Arc::new(Stub {
            stall: true,
            ..Stub::default()
        });
        let rents = vec![lease("느티마을", 84.0, 110_000, 0)];
        let bundle = collector(stub)
            .collect(&complex("느티마을", 84.0, "11680"), &household(), &rents)
            .await;

        assert_eq!(bundle.transit_distance, Lookup::NotFound);
        assert_eq!(bundle.commute_minutes, DEFAULT_COMMUTE_MINUTES);
        assert_eq!(bundle.matching_rents.len(), 1);
    }
}
