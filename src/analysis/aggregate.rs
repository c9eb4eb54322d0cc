//! Transaction aggregator - groups individual deals into apartment complexes

use crate::ingestion::types::RawDeal;
use crate::ingestion::utils::round1;
use serde::Serialize;
use std::collections::HashMap;

/// One apartment complex within the current analysis window.
///
/// A complex always holds at least one deal: it can only be created from a
/// first deal, and the derived figures are refreshed on every `push`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexAggregate {
    pub name: String,
    pub dong: String,
    pub jibun: String,
    pub build_year: String,
    /// Region code the deals were reported under
    pub lawd_code: String,
    pub avg_price: i64,
    pub avg_area: f64,
    pub min_price: i64,
    pub max_price: i64,
    pub transaction_count: usize,
    #[serde(skip)]
    deals: Vec<RawDeal>,
}

impl ComplexAggregate {
    pub fn new(first: RawDeal) -> Self {
        let mut complex = Self {
            name: first.apt_name.clone(),
            dong: first.dong.clone(),
            jibun: first.jibun.clone(),
            build_year: first.build_year.clone(),
            lawd_code: first.lawd_code.clone(),
            avg_price: 0,
            avg_area: 0.0,
            min_price: 0,
            max_price: 0,
            transaction_count: 0,
            deals: vec![first],
        };
        complex.recompute();
        complex
    }

    pub fn push(&mut self, deal: RawDeal) {
        self.deals.push(deal);
        self.recompute();
    }

    pub fn deals(&self) -> &[RawDeal] {
        &self.deals
    }

    fn recompute(&mut self) {
        let count = self.deals.len();
        let total_price: i64 = self.deals.iter().map(|d| d.deal_amount).sum();
        let total_area: f64 = self.deals.iter().map(|d| d.area).sum();

        self.transaction_count = count;
        self.avg_price = (total_price as f64 / count as f64).round() as i64;
        self.avg_area = round1(total_area / count as f64);
        self.min_price = self.deals.iter().map(|d| d.deal_amount).min().unwrap_or(0);
        self.max_price = self.deals.iter().map(|d| d.deal_amount).max().unwrap_or(0);
    }
}

/// Partition deals by exact complex name, keeping first-seen order
pub fn group_by_complex(deals: Vec<RawDeal>) -> Vec<ComplexAggregate> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut complexes: Vec<ComplexAggregate> = Vec::new();

    for deal in deals {
        match index.get(&deal.apt_name) {
            Some(&i) => complexes[i].push(deal),
            None => {
                index.insert(deal.apt_name.clone(), complexes.len());
                complexes.push(ComplexAggregate::new(deal));
            }
        }
    }

    complexes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(name: &str, amount: i64, area: f64) -> RawDeal {
        RawDeal {
            apt_name: name.to_string(),
            dong: "개포동".to_string(),
            jibun: "12".to_string(),
            build_year: "2019".to_string(),
            deal_amount: amount,
            area,
            floor: 7,
            deal_year: "2025".to_string(),
            deal_month: "3".to_string(),
            deal_day: "14".to_string(),
            lawd_code: "11680".to_string(),
        }
    }

    #[test]
    fn test_group_by_complex_statistics() {
        let deals = vec![
            deal("래미안블레스티지", 100_000, 84.9),
            deal("디에이치아너힐즈", 150_000, 59.9),
            deal("래미안블레스티지", 101_001, 84.0),
            deal("래미안블레스티지", 99_000, 84.5),
        ];
        let complexes = group_by_complex(deals);

        assert_eq!(complexes.len(), 2);
        assert_eq!(complexes[0].name, "래미안블레스티지");
        assert_eq!(complexes[1].name, "디에이치아너힐즈");

        let first = &complexes[0];
        assert_eq!(first.transaction_count, 3);
        assert_eq!(first.deals().len(), 3);
        // (100000 + 101001 + 99000) / 3 = 100000.33
        assert_eq!(first.avg_price, 100_000);
        assert_eq!(first.avg_area, 84.5);
        assert_eq!(first.min_price, 99_000);
        assert_eq!(first.max_price, 101_001);
    }

    #[test]
    fn test_push_refreshes_derived_figures() {
        let mut complex = ComplexAggregate::new(deal("자이", 80_000, 59.0));
        assert_eq!(complex.avg_price, 80_000);

        complex.push(deal("자이", 90_001, 60.0));
        assert_eq!(complex.transaction_count, 2);
        assert_eq!(complex.avg_price, 85_001);
        assert_eq!(complex.avg_area, 59.5);
    }

    #[test]
    fn test_group_by_complex_empty_input() {
        assert!(group_by_complex(Vec::new()).is_empty());
    }
}
