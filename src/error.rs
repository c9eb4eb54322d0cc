//! Errors that cross the analysis boundary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A required parameter is missing or malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no administrative code registered for region '{0}'")]
    RegionNotFound(String),

    #[error("no transactions found in the searched regions ({})", .regions.join(", "))]
    NoTransactions { regions: Vec<String> },

    #[error("no complexes found within budget {budget}; try adjusting the budget")]
    OutOfBudget { budget: i64 },

    #[error("no complexes within budget built in {min_build_year} or later; try relaxing the search")]
    NoRecentBuilds { min_build_year: i32 },

    #[error("no large complexes remain after filtering; disable the large-complex filter")]
    NoLargeComplexes,
}

impl AnalysisError {
    /// Errors meaning the search criteria matched nothing and should be relaxed
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            AnalysisError::NoTransactions { .. }
                | AnalysisError::OutOfBudget { .. }
                | AnalysisError::NoRecentBuilds { .. }
                | AnalysisError::NoLargeComplexes
        )
    }

    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "invalid_input",
            AnalysisError::RegionNotFound(_) => "region_not_found",
            AnalysisError::NoTransactions { .. } => "no_transactions",
            AnalysisError::OutOfBudget { .. } => "out_of_budget",
            AnalysisError::NoRecentBuilds { .. } => "no_recent_builds",
            AnalysisError::NoLargeComplexes => "no_large_complexes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_classification() {
        assert!(AnalysisError::OutOfBudget { budget: 1 }.is_empty_result());
        assert!(AnalysisError::NoTransactions { regions: vec![] }.is_empty_result());
        assert!(!AnalysisError::InvalidInput("x".into()).is_empty_result());
        assert!(!AnalysisError::RegionNotFound("x".into()).is_empty_result());
    }

    #[test]
    fn test_no_transactions_message_lists_regions() {
        let err = AnalysisError::NoTransactions {
            regions: vec!["강남구".to_string(), "서초구".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no transactions found in the searched regions (강남구, 서초구)"
        );
    }
}
