//! Utility functions for common operations

use crate::ingestion::types::YearMonth;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl FetchError {
    /// Credentials rejected or the service is not enabled for them
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            FetchError::Status(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

/// HTTP client shared by every upstream provider
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

/// Send a prepared GET and return the body text
pub async fn http_get(request: RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let body = response.text().await?;
    debug!("Downloaded {} bytes", body.len());
    Ok(body)
}

/// Parse an amount reported as text such as "  82,500"
pub fn parse_amount(text: &str) -> Option<i64> {
    let clean = text.replace(',', "");
    clean.trim().parse::<i64>().ok()
}

/// The `months` most recent contract months, newest first
pub fn trailing_months(today: NaiveDate, months: usize) -> Vec<YearMonth> {
    let mut current = YearMonth::of(today);
    let mut out = Vec::with_capacity(months);
    for _ in 0..months {
        out.push(current);
        current = current.previous();
    }
    out
}

/// Format a geocodable address from its components
pub fn format_address(province: &str, dong: &str, jibun: &str) -> String {
    [province, dong, jibun]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("    82,500"), Some(82_500));
        assert_eq!(parse_amount("125000"), Some(125_000));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn test_trailing_months_crosses_year_boundary() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let months: Vec<String> = trailing_months(today, 3)
            .iter()
            .map(|ym| ym.to_string())
            .collect();

        assert_eq!(months, vec!["202502", "202501", "202412"]);
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address("서울", "개포동", "123"), "서울 개포동 123");
        assert_eq!(format_address("서울", "개포동", " "), "서울 개포동");
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(72.0), 72.0);
        assert_eq!(round1(84.46), 84.5);
        assert_eq!(round1(71.94), 71.9);
    }

    #[test]
    fn test_unauthorized_statuses() {
        assert!(FetchError::Status(StatusCode::FORBIDDEN).is_unauthorized());
        assert!(!FetchError::Status(StatusCode::BAD_GATEWAY).is_unauthorized());
    }
}
