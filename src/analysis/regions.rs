//! Region resolver: workplace text to candidate regions and their codes

use crate::analysis::catalog::Catalog;
use crate::error::AnalysisError;
use crate::ingestion::types::LawdCode;
use tracing::debug;

/// Separator between multiple workplaces in one description
pub const WORKPLACE_DELIMITER: char = '/';

pub type RegionTable = [(&'static str, &'static [&'static str])];

/// One way of matching a workplace segment against the keyword table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Segment equals a table key
    ExactKey,
    /// Segment contains a key, or a key contains the segment
    Containment,
    /// Segment is used verbatim as a region
    Literal,
}

impl MatchStrategy {
    /// Strategies in the order they are tried
    pub const ORDER: [MatchStrategy; 3] = [
        MatchStrategy::ExactKey,
        MatchStrategy::Containment,
        MatchStrategy::Literal,
    ];

    pub fn apply(self, table: &RegionTable, segment: &str) -> Option<Vec<String>> {
        match self {
            MatchStrategy::ExactKey => table
                .iter()
                .find(|(key, _)| *key == segment)
                .map(|(_, regions)| to_owned_list(regions)),
            MatchStrategy::Containment => table
                .iter()
                .find(|(key, _)| segment.contains(key) || key.contains(segment))
                .map(|(_, regions)| to_owned_list(regions)),
            MatchStrategy::Literal => Some(vec![segment.to_string()]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegionResolver<'a> {
    catalog: &'a Catalog,
}

impl<'a> RegionResolver<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Regions to search for a workplace description such as "판교/여의도".
    /// Order follows first appearance; duplicates are dropped.
    pub fn resolve_regions(&self, workplace: &str) -> Vec<String> {
        let mut regions: Vec<String> = Vec::new();

        for segment in workplace.split(WORKPLACE_DELIMITER) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let matched = MatchStrategy::ORDER
                .iter()
                .find_map(|strategy| {
                    strategy
                        .apply(self.catalog.workplace_regions, segment)
                        .map(|found| (*strategy, found))
                });

            if let Some((strategy, found)) = matched {
                debug!("Workplace '{}' matched by {:?}: {:?}", segment, strategy, found);
                push_unique(&mut regions, found);
            }
        }

        regions
    }

    /// Regions lying between two workplaces. Best effort: empty when the
    /// pair is unknown.
    pub fn resolve_midpoint_regions(&self, first: &str, second: &str) -> Vec<String> {
        let (a, b) = (first.trim(), second.trim());
        if a.is_empty() || b.is_empty() {
            return Vec::new();
        }

        let table = self.catalog.midpoint_regions;
        let exact = table.iter().find(|(w1, w2, _)| *w1 == a && *w2 == b);
        let reverse = || table.iter().find(|(w1, w2, _)| *w1 == b && *w2 == a);
        let contained = || {
            table.iter().find(|(w1, w2, _)| {
                (a.contains(w1) && b.contains(w2)) || (a.contains(w2) && b.contains(w1))
            })
        };

        exact
            .or_else(reverse)
            .or_else(contained)
            .map(|(_, _, regions)| to_owned_list(regions))
            .unwrap_or_default()
    }

    pub fn region_code(&self, region: &str) -> Result<LawdCode, AnalysisError> {
        self.catalog.region_code(region)
    }
}

fn to_owned_list(regions: &[&str]) -> Vec<String> {
    regions.iter().map(|r| r.to_string()).collect()
}

fn push_unique(regions: &mut Vec<String>, found: Vec<String>) {
    for region in found {
        if !regions.contains(&region) {
            regions.push(region);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> RegionResolver<'static> {
        static CATALOG: std::sync::OnceLock<Catalog> = std::sync::OnceLock::new();
        RegionResolver::new(CATALOG.get_or_init(Catalog::standard))
    }

    #[test]
    fn test_strategies_in_isolation() {
        let table = Catalog::standard().workplace_regions;

        assert_eq!(
            MatchStrategy::ExactKey.apply(table, "수지"),
            Some(vec!["수지구".to_string(), "용인시".to_string(), "분당구".to_string()])
        );
        assert_eq!(MatchStrategy::ExactKey.apply(table, "수지역"), None);
        assert!(MatchStrategy::Containment.apply(table, "수지역").is_some());
        assert_eq!(
            MatchStrategy::Literal.apply(table, "제주"),
            Some(vec!["제주".to_string()])
        );
    }

    #[test]
    fn test_multiple_workplaces_are_merged_without_duplicates() {
        let regions = resolver().resolve_regions("강남/판교");
        assert_eq!(
            regions,
            vec![
                "강남구", "서초구", "송파구", "강동구", "분당구", "수지구", "기흥구", "용인시",
                "성남시"
            ]
        );
    }

    #[test]
    fn test_containment_and_literal_fallback() {
        let r = resolver();
        assert_eq!(r.resolve_regions("강남역 근처")[0], "강남구");
        assert_eq!(r.resolve_regions("제주"), vec!["제주"]);
        assert!(r.resolve_regions(" / ").is_empty());
    }

    #[test]
    fn test_midpoint_exact_reverse_and_containment() {
        let r = resolver();
        let expected = vec!["의왕시", "수원시", "군포시", "안양시"];

        assert_eq!(r.resolve_midpoint_regions("화성", "과천"), expected);
        assert_eq!(r.resolve_midpoint_regions("과천", "화성"), expected);
        assert_eq!(
            r.resolve_midpoint_regions("화성시 동탄", "강남구 역삼"),
            vec!["수원시", "용인시", "성남시", "분당구"]
        );
        assert!(r.resolve_midpoint_regions("부산", "대구").is_empty());
    }

    #[test]
    fn test_unknown_region_code_is_not_found() {
        assert!(matches!(
            resolver().region_code("제주"),
            Err(AnalysisError::RegionNotFound(_))
        ));
    }
}
