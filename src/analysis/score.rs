//! Scoring engine - eight weighted sub-scores per complex
//!
//! Every sub-score is a pure function of the complex, its enrichment bundle
//! and the static catalog, clamped to 0..=100. Band boundaries and weights
//! are fixed policy constants.

use crate::analysis::aggregate::ComplexAggregate;
use crate::analysis::catalog::{first_tier_score, Catalog};
use crate::analysis::filter::parse_build_year;
use crate::analysis::geo::{locate, nearest_landmark, proximity_score};
use crate::ingestion::types::{EnrichmentBundle, Lookup, RentDeal};
use crate::ingestion::utils::round1;
use serde::Serialize;
use tracing::debug;

/// Scoring factors with their fixed weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Location,
    Household,
    Supply,
    Education,
    Market,
    Brand,
    Age,
    Psychology,
}

impl Factor {
    /// Summation order of the weighted total
    pub const ALL: [Factor; 8] = [
        Factor::Location,
        Factor::Household,
        Factor::Supply,
        Factor::Education,
        Factor::Market,
        Factor::Brand,
        Factor::Age,
        Factor::Psychology,
    ];

    pub fn weight(self) -> f64 {
        match self {
            Factor::Location => 0.30,
            Factor::Household => 0.15,
            Factor::Supply => 0.15,
            Factor::Education => 0.10,
            Factor::Market => 0.10,
            Factor::Brand => 0.10,
            Factor::Age => 0.10,
            Factor::Psychology => 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSet {
    pub location: i32,
    pub household: i32,
    pub brand: i32,
    pub supply: i32,
    pub education: i32,
    pub age: i32,
    pub market: i32,
    pub psychology: i32,
    /// Deposit-only lease price as a percentage of the sale price
    pub jeonse_ratio: Option<f64>,
}

impl ScoreSet {
    pub fn get(&self, factor: Factor) -> i32 {
        match factor {
            Factor::Location => self.location,
            Factor::Household => self.household,
            Factor::Supply => self.supply,
            Factor::Education => self.education,
            Factor::Market => self.market,
            Factor::Brand => self.brand,
            Factor::Age => self.age,
            Factor::Psychology => self.psychology,
        }
    }

    /// Rounded weighted sum, kept within 0..=100
    pub fn total(&self) -> i32 {
        let weighted: f64 = Factor::ALL
            .iter()
            .map(|&f| f64::from(self.get(f)) * f.weight())
            .sum();
        clamp_score(weighted)
    }
}

fn clamp_score(value: f64) -> i32 {
    value.round().clamp(0.0, 100.0) as i32
}

/// Scores complexes against one catalog and a fixed reference year
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    catalog: &'a Catalog,
    current_year: i32,
}

impl<'a> Scorer<'a> {
    pub fn new(catalog: &'a Catalog, current_year: i32) -> Self {
        Self {
            catalog,
            current_year,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn score(&self, complex: &ComplexAggregate, bundle: &EnrichmentBundle) -> ScoreSet {
        let jeonse_ratio = jeonse_ratio(complex.avg_price, &bundle.matching_rents);

        let scores = ScoreSet {
            location: self.location_score(&complex.dong, bundle.transit_distance),
            household: household_score(complex.transaction_count),
            brand: self.brand_score(&complex.name),
            supply: supply_score(bundle.construction),
            education: self.education_score(&complex.dong),
            age: self.age_score(&complex.build_year),
            market: market_score(complex.transaction_count, complex.avg_price, jeonse_ratio),
            psychology: psychology_score(bundle.unsold),
            jeonse_ratio,
        };

        debug!(
            "Scored {} ({}): location={} household={} brand={} supply={} education={} age={} market={} psychology={} jeonse={:?}",
            complex.name,
            complex.dong,
            scores.location,
            scores.household,
            scores.brand,
            scores.supply,
            scores.education,
            scores.age,
            scores.market,
            scores.psychology,
            scores.jeonse_ratio
        );

        scores
    }

    /// Proximity to employment hubs plus station access
    pub fn location_score(&self, dong: &str, transit: Lookup<u32>) -> i32 {
        let mut score = 50.0;

        let nearest = locate(dong, self.catalog.dong_coordinates)
            .and_then(|point| nearest_landmark(point, self.catalog.business_districts));

        score += match nearest {
            Some(hub) => proximity_score(hub.weight, hub.distance_m / 1000.0) * 0.4,
            None => f64::from(
                first_tier_score(self.catalog.location_fallback, dong)
                    .unwrap_or(self.catalog.location_fallback_default),
            ),
        };

        score += match transit {
            Lookup::Found(meters) => match meters {
                0..=300 => 15.0,
                301..=500 => 12.0,
                501..=800 => 8.0,
                801..=1000 => 4.0,
                _ => 0.0,
            },
            Lookup::NotFound => {
                if self.catalog.transit_keywords.iter().any(|k| dong.contains(k)) {
                    10.0
                } else {
                    5.0
                }
            }
        };

        clamp_score(score)
    }

    pub fn brand_score(&self, name: &str) -> i32 {
        first_tier_score(self.catalog.brand_tiers, name).unwrap_or(self.catalog.brand_default)
    }

    pub fn education_score(&self, dong: &str) -> i32 {
        first_tier_score(self.catalog.education_tiers, dong)
            .unwrap_or(self.catalog.education_default)
    }

    /// Years since completion, or `None` when the build year is not numeric
    pub fn age_of(&self, build_year: &str) -> Option<i32> {
        parse_build_year(build_year).map(|year| self.current_year - year)
    }

    pub fn age_score(&self, build_year: &str) -> i32 {
        match self.age_of(build_year) {
            Some(age) if age <= 5 => 95,
            Some(age) if age <= 10 => 90,
            Some(age) if age <= 15 => 80,
            Some(age) if age <= 20 => 70,
            // Reconstruction upside
            Some(age) if age >= 30 => 75,
            _ => 60,
        }
    }
}

/// Deal volume as a proxy for the number of units
pub fn household_score(transaction_count: usize) -> i32 {
    match transaction_count {
        n if n >= 10 => 100,
        n if n >= 5 => 85,
        n if n >= 3 => 70,
        _ => 50,
    }
}

/// New supply pressure from regional construction starts
pub fn supply_score(construction: Lookup<u32>) -> i32 {
    let adjustment = match construction {
        Lookup::Found(0) => 25,
        Lookup::Found(n) if n < 1000 => 15,
        Lookup::Found(n) if n < 3000 => 5,
        Lookup::Found(n) if n < 5000 => -10,
        Lookup::Found(_) => -25,
        Lookup::NotFound => 0,
    };
    (75 + adjustment).clamp(0, 100)
}

/// Market sentiment from regional unsold inventory
pub fn psychology_score(unsold: Lookup<u32>) -> i32 {
    let adjustment = match unsold {
        Lookup::Found(0) => 50,
        Lookup::Found(n) if n < 500 => 30,
        Lookup::Found(n) if n < 1000 => 10,
        Lookup::Found(n) if n < 2000 => -20,
        Lookup::Found(_) => -40,
        Lookup::NotFound => 0,
    };
    (50 + adjustment).clamp(0, 100)
}

/// Liquidity, price band and jeonse band
pub fn market_score(transaction_count: usize, avg_price: i64, jeonse_ratio: Option<f64>) -> i32 {
    let mut score = 45.0;

    score += (transaction_count as f64 * 1.5).min(30.0);

    score += match avg_price {
        80_000..=200_000 => 10.0,
        50_000..=79_999 => 7.0,
        200_001..=300_000 => 7.0,
        _ => -5.0,
    };

    score += match jeonse_ratio {
        Some(r) if (70.0..=80.0).contains(&r) => 15.0,
        Some(r) if (65.0..70.0).contains(&r) => 11.0,
        Some(r) if (80.0..85.0).contains(&r) => 10.0,
        Some(r) if (60.0..65.0).contains(&r) => 8.0,
        Some(r) if r >= 85.0 => 5.0,
        Some(_) => 3.0,
        None => 7.0,
    };

    clamp_score(score)
}

/// Mean deposit of the matching leases as a percentage of the average sale
/// price, to one decimal. `None` without matching leases.
pub fn jeonse_ratio(avg_price: i64, matching_rents: &[RentDeal]) -> Option<f64> {
    if matching_rents.is_empty() || avg_price <= 0 {
        return None;
    }

    let total: f64 = matching_rents.iter().map(|r| r.deposit as f64).sum();
    let avg_deposit = total / matching_rents.len() as f64;

    Some(round1(avg_deposit / avg_price as f64 * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::types::RawDeal;

    const YEAR: i32 = 2026;

    fn complex(name: &str, dong: &str, price: i64, build_year: &str, deals: usize) -> ComplexAggregate {
        let deal = RawDeal {
            apt_name: name.to_string(),
            dong: dong.to_string(),
            jibun: "1".to_string(),
            build_year: build_year.to_string(),
            deal_amount: price,
            area: 84.0,
            floor: 10,
            deal_year: "2026".to_string(),
            deal_month: "9".to_string(),
            deal_day: "1".to_string(),
            lawd_code: "11680".to_string(),
        };
        let mut c = ComplexAggregate::new(deal.clone());
        for _ in 1..deals {
            c.push(deal.clone());
        }
        c
    }

    fn lease(deposit: i64) -> RentDeal {
        RentDeal {
            apt_name: "래미안".to_string(),
            dong: "대치동".to_string(),
            deposit,
            monthly_rent: 0,
            area: 84.0,
            build_year: "2022".to_string(),
            contract_year: "2026".to_string(),
            contract_month: "9".to_string(),
            contract_day: "3".to_string(),
        }
    }

    #[test]
    fn test_weights_are_fixed() {
        let sum: f64 = Factor::ALL.iter().map(|f| f.weight()).sum();
        assert!((sum - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_premium_complex_without_regional_data() {
        let catalog = Catalog::standard();
        let scorer = Scorer::new(&catalog, YEAR);
        let c = complex("래미안 대치팰리스", "대치동", 100_000, "2022", 12);

        let scores = scorer.score(&c, &EnrichmentBundle::default());

        assert_eq!(scores.household, 100);
        assert_eq!(scores.brand, 95);
        assert_eq!(scores.education, 95);
        assert_eq!(scores.age, 95);
        assert_eq!(scores.supply, 75);
        assert_eq!(scores.psychology, 50);
        // 50 + 95 * 0.4 (Samseong station, 1.6 km) + 5 (no station keyword)
        assert_eq!(scores.location, 93);
        // 45 + 18 liquidity + 10 price band + 7 without jeonse data
        assert_eq!(scores.market, 80);
        assert_eq!(scores.jeonse_ratio, None);
        // 27.9 + 15 + 11.25 + 9.5 + 8 + 9.5 + 9.5 + 2.5 = 93.15
        assert_eq!(scores.total(), 93);
    }

    #[test]
    fn test_location_falls_back_to_keywords() {
        let catalog = Catalog::standard();
        let scorer = Scorer::new(&catalog, YEAR);

        // No coordinates for 세곡동: 50 + 27 + 5
        assert_eq!(scorer.location_score("세곡동", Lookup::NotFound), 82);
        // Unknown dong: 50 + 15, then station distance bands
        assert_eq!(scorer.location_score("송도동", Lookup::Found(250)), 80);
        assert_eq!(scorer.location_score("송도동", Lookup::Found(1001)), 65);
        // Pangyo station at 3.9 km: 50 + 81 * 0.4 + 10 (station keyword)
        assert_eq!(scorer.location_score("정자동", Lookup::NotFound), 92);
    }

    #[test]
    fn test_age_bands() {
        let catalog = Catalog::standard();
        let scorer = Scorer::new(&catalog, YEAR);

        assert_eq!(scorer.age_score("2021"), 95);
        assert_eq!(scorer.age_score("2016"), 90);
        assert_eq!(scorer.age_score("2011"), 80);
        assert_eq!(scorer.age_score("2006"), 70);
        assert_eq!(scorer.age_score("2000"), 60);
        assert_eq!(scorer.age_score("1996"), 75);
        assert_eq!(scorer.age_score("unknown"), 60);
    }

    #[test]
    fn test_supply_and_psychology_bands() {
        assert_eq!(supply_score(Lookup::NotFound), 75);
        assert_eq!(supply_score(Lookup::Found(0)), 100);
        assert_eq!(supply_score(Lookup::Found(999)), 90);
        assert_eq!(supply_score(Lookup::Found(2999)), 80);
        assert_eq!(supply_score(Lookup::Found(4999)), 65);
        assert_eq!(supply_score(Lookup::Found(5000)), 50);

        assert_eq!(psychology_score(Lookup::NotFound), 50);
        assert_eq!(psychology_score(Lookup::Found(0)), 100);
        assert_eq!(psychology_score(Lookup::Found(499)), 80);
        assert_eq!(psychology_score(Lookup::Found(999)), 60);
        assert_eq!(psychology_score(Lookup::Found(1999)), 30);
        assert_eq!(psychology_score(Lookup::Found(2000)), 10);
    }

    #[test]
    fn test_market_jeonse_bands() {
        // 45 + 3 + 10 = 58 before the jeonse term
        assert_eq!(market_score(2, 100_000, Some(75.0)), 73);
        assert_eq!(market_score(2, 100_000, Some(67.0)), 69);
        assert_eq!(market_score(2, 100_000, Some(82.0)), 68);
        assert_eq!(market_score(2, 100_000, Some(62.0)), 66);
        assert_eq!(market_score(2, 100_000, Some(90.0)), 63);
        assert_eq!(market_score(2, 100_000, Some(40.0)), 61);
        assert_eq!(market_score(2, 100_000, None), 65);
        // Extreme price band and capped liquidity
        assert_eq!(market_score(40, 500_000, None), 77);
    }

    #[test]
    fn test_household_and_brand() {
        let catalog = Catalog::standard();
        let scorer = Scorer::new(&catalog, YEAR);

        assert_eq!(household_score(10), 100);
        assert_eq!(household_score(5), 85);
        assert_eq!(household_score(3), 70);
        assert_eq!(household_score(2), 50);

        assert_eq!(scorer.brand_score("힐스테이트 판교"), 95);
        assert_eq!(scorer.brand_score("두산위브"), 85);
        assert_eq!(scorer.brand_score("한빛마을"), 65);
    }

    #[test]
    fn test_jeonse_ratio_from_matching_leases() {
        assert_eq!(jeonse_ratio(100_000, &[lease(70_000), lease(74_000)]), Some(72.0));
        assert_eq!(jeonse_ratio(100_000, &[]), None);
    }

    #[test]
    fn test_every_sub_score_within_bounds() {
        let catalog = Catalog::standard();
        let scorer = Scorer::new(&catalog, YEAR);
        let bundle = EnrichmentBundle {
            transit_distance: Lookup::Found(100),
            unsold: Lookup::Found(0),
            construction: Lookup::Found(0),
            ..EnrichmentBundle::default()
        };

        for c in [
            complex("래미안", "청담동", 150_000, "2025", 30),
            complex("무명", "알수없는동", 1, "1950", 1),
        ] {
            let scores = scorer.score(&c, &bundle);
            for factor in Factor::ALL {
                let s = scores.get(factor);
                assert!((0..=100).contains(&s), "{factor:?} = {s}");
            }
            assert!((0..=100).contains(&scores.total()));
        }
    }
}
