//! Core data types for the ingestion pipeline
//! Pure data structures with no behavior beyond validation

use crate::error::AnalysisError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Raw payloads from the upstream providers - tagged unions
#[derive(Debug)]
pub enum RawData {
    Xml(String),
    Json(serde_json::Value),
}

impl RawData {
    pub fn as_xml(&self) -> anyhow::Result<&str> {
        match self {
            RawData::Xml(text) => Ok(text),
            _ => Err(anyhow::anyhow!("Expected Xml, got {:?}", self)),
        }
    }

    pub fn as_json(&self) -> anyhow::Result<&serde_json::Value> {
        match self {
            RawData::Json(json) => Ok(json),
            _ => Err(anyhow::anyhow!("Expected Json, got {:?}", self)),
        }
    }
}

/// 5-digit administrative region code used by the transaction APIs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LawdCode(String);

impl LawdCode {
    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        let trimmed = value.trim();
        if trimmed.len() != 5 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(AnalysisError::InvalidInput(format!(
                "lawd code must be exactly 5 digits, got '{value}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LawdCode {
    type Error = AnalysisError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LawdCode> for String {
    fn from(code: LawdCode) -> Self {
        code.0
    }
}

impl std::fmt::Display for LawdCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract month, rendered as YYYYMM
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn parse(value: &str) -> Result<Self, AnalysisError> {
        let invalid = || {
            AnalysisError::InvalidInput(format!("year-month must be YYYYMM, got '{value}'"))
        };
        if value.len() != 6 || !value.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = value[..4].parse::<i32>().map_err(|_| invalid())?;
        let month = value[4..].parse::<u32>().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// One government-reported sale. Amounts are in units of 10,000 KRW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDeal {
    pub apt_name: String,
    pub dong: String,
    pub jibun: String,
    pub build_year: String,
    pub deal_amount: i64,
    pub area: f64,
    pub floor: i32,
    pub deal_year: String,
    pub deal_month: String,
    pub deal_day: String,
    /// Region code the deal was reported under
    pub lawd_code: String,
}

/// One reported lease. `monthly_rent == 0` is a deposit-only (jeonse) lease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentDeal {
    pub apt_name: String,
    pub dong: String,
    pub deposit: i64,
    pub monthly_rent: i64,
    pub area: f64,
    pub build_year: String,
    pub contract_year: String,
    pub contract_month: String,
    pub contract_day: String,
}

impl RentDeal {
    pub fn is_jeonse(&self) -> bool {
        self.monthly_rent == 0
    }
}

/// Result of an auxiliary lookup: either real data or an explicit absence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// Auxiliary signals gathered for one complex
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentBundle {
    /// Meters to the nearest major station
    pub transit_distance: Lookup<u32>,
    /// Region-level unsold units
    pub unsold: Lookup<u32>,
    /// Region-level construction starts, trailing 3 months
    pub construction: Lookup<u32>,
    pub commute_minutes: u32,
    #[serde(skip)]
    pub matching_rents: Vec<RentDeal>,
}

impl Default for EnrichmentBundle {
    fn default() -> Self {
        Self {
            transit_distance: Lookup::NotFound,
            unsold: Lookup::NotFound,
            construction: Lookup::NotFound,
            commute_minutes: DEFAULT_COMMUTE_MINUTES,
            matching_rents: Vec::new(),
        }
    }
}

/// Commute time assumed when no estimate is available
pub const DEFAULT_COMMUTE_MINUTES: u32 = 60;
