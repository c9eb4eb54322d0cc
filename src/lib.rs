// Library module for the apartment investment analysis backend

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod ingestion;

pub use error::AnalysisError;
