//! Analysis pipeline - resolve regions, aggregate, filter, score and rank

pub mod aggregate;
pub mod catalog;
pub mod filter;
pub mod geo;
pub mod pipeline;
pub mod rank;
pub mod regions;
pub mod score;

pub use aggregate::{group_by_complex, ComplexAggregate};
pub use catalog::Catalog;
pub use pipeline::{AnalysisOptions, Analyzer, AnalyzerSettings, HouseholdProfile};
pub use rank::{rank, RankedResult, Verdict};
pub use score::{ScoreSet, Scorer};
