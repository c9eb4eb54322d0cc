//! Data ingestion module - upstream fetch, parse, cache and enrichment

pub mod cache;
pub mod enrich;
pub mod fetch;
pub mod parse;
pub mod sources;
pub mod types;
pub mod utils;

pub use types::*;
