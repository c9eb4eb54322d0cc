//! Fetch functions - retrieve raw payloads from the upstream providers

use crate::ingestion::types::{LawdCode, RawData, YearMonth};
use crate::ingestion::utils::http_get;
use anyhow::Result;
use reqwest::Client;
use tracing::{debug, info};

const MOLIT_TRADE_URL: &str =
    "https://apis.data.go.kr/1613000/RTMSDataSvcAptTrade/getRTMSDataSvcAptTrade";
const MOLIT_RENT_URL: &str =
    "https://apis.data.go.kr/1613000/RTMSDataSvcAptRent/getRTMSDataSvcAptRent";
const KOSIS_URL: &str = "https://kosis.kr/openapi/Param/statisticsParameterData.do";
const NAVER_GEOCODE_URL: &str = "https://naveropenapi.apigw.ntruss.com/map-geocode/v2/geocode";

const USER_AGENT: &str = "Mozilla/5.0 (compatible; apt-invest-backend)";

/// Apartment datasets published by the land ministry (MOLIT)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MolitDataset {
    Trade,
    Rent,
}

impl MolitDataset {
    fn url(self) -> &'static str {
        match self {
            MolitDataset::Trade => MOLIT_TRADE_URL,
            MolitDataset::Rent => MOLIT_RENT_URL,
        }
    }
}

/// Fetch one month of apartment trade or rent records (XML)
pub async fn fetch_molit(
    client: &Client,
    api_key: &str,
    dataset: MolitDataset,
    code: &LawdCode,
    month: YearMonth,
) -> Result<RawData> {
    let deal_ymd = month.to_string();
    info!("Fetching MOLIT {:?} for {} {}", dataset, code, deal_ymd);

    let request = client
        .get(dataset.url())
        .query(&[
            ("serviceKey", api_key),
            ("LAWD_CD", code.as_str()),
            ("DEAL_YMD", deal_ymd.as_str()),
            ("numOfRows", "100"),
            ("pageNo", "1"),
        ])
        .header("Accept", "application/xml")
        .header("User-Agent", USER_AGENT);

    let body = http_get(request).await?;
    Ok(RawData::Xml(body))
}

/// Statistics tables published through KOSIS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KosisTable {
    /// Unsold housing by city/district
    Unsold,
    /// Apartment construction starts
    Construction,
}

impl KosisTable {
    fn query(self) -> [(&'static str, &'static str); 16] {
        let (item_id, table_id, level3) = match self {
            KosisTable::Unsold => ("13103871087T1+", "DT_MLTM_2082", ""),
            KosisTable::Construction => ("13103766971T1+", "DT_MLTM_5386", "ALL"),
        };
        [
            ("method", "getList"),
            ("itmId", item_id),
            ("objL1", "ALL"),
            ("objL2", "ALL"),
            ("objL3", level3),
            ("objL4", ""),
            ("objL5", ""),
            ("objL6", ""),
            ("objL7", ""),
            ("objL8", ""),
            ("format", "json"),
            ("jsonVD", "Y"),
            ("prdSe", "M"),
            ("newEstPrdCnt", "3"),
            ("orgId", "116"),
            ("tblId", table_id),
        ]
    }
}

/// Fetch the three most recent monthly rows of a statistics table (JSON)
pub async fn fetch_kosis(client: &Client, api_key: &str, table: KosisTable) -> Result<RawData> {
    info!("Fetching KOSIS {:?}", table);

    let request = client
        .get(KOSIS_URL)
        .query(&table.query())
        .query(&[("apiKey", api_key)])
        .header("User-Agent", USER_AGENT);

    let body = http_get(request).await?;
    let json: serde_json::Value = serde_json::from_str(&body)?;
    Ok(RawData::Json(json))
}

/// Credentials for the Naver maps gateway
#[derive(Debug, Clone)]
pub struct NaverCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Geocode a free-form address (JSON)
pub async fn fetch_naver_geocode(
    client: &Client,
    credentials: &NaverCredentials,
    address: &str,
) -> Result<RawData> {
    debug!("Geocoding {}", address);

    let request = client
        .get(NAVER_GEOCODE_URL)
        .query(&[("query", address)])
        .header("X-NCP-APIGW-API-KEY-ID", &credentials.client_id)
        .header("X-NCP-APIGW-API-KEY", &credentials.client_secret);

    let body = http_get(request).await?;
    let json: serde_json::Value = serde_json::from_str(&body)?;
    Ok(RawData::Json(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::utils::build_client;
    use std::time::Duration;

    #[test]
    fn test_kosis_tables_differ_in_item_and_level() {
        let unsold = KosisTable::Unsold.query();
        let construction = KosisTable::Construction.query();

        assert!(unsold.contains(&("tblId", "DT_MLTM_2082")));
        assert!(unsold.contains(&("objL3", "")));
        assert!(construction.contains(&("tblId", "DT_MLTM_5386")));
        assert!(construction.contains(&("objL3", "ALL")));
    }

    #[tokio::test]
    #[ignore] // Ignore by default since it hits real API
    async fn test_fetch_molit_trade() {
        let api_key = std::env::var("MOLIT_API_KEY").unwrap();
        let client = build_client(Duration::from_secs(10)).unwrap();
        let code = LawdCode::parse("11680").unwrap();
        let month = YearMonth::parse("202401").unwrap();

        let raw = fetch_molit(&client, &api_key, MolitDataset::Trade, &code, month)
            .await
            .unwrap();
        assert!(raw.as_xml().unwrap().contains("resultCode"));
    }
}
