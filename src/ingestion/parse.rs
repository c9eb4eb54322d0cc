//! Parse functions - transform raw payloads into domain records

use crate::analysis::geo::GeoPoint;
use crate::ingestion::types::{LawdCode, Lookup, RawData, RawDeal, RentDeal};
use crate::ingestion::utils::parse_amount;
use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

/// MOLIT response envelope: `<response><header/><body><items><item/>...`
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct MolitEnvelope<T> {
    header: MolitHeader,
    body: Option<MolitBody<T>>,
}

#[derive(Debug, Deserialize)]
struct MolitHeader {
    #[serde(rename = "resultCode")]
    result_code: String,

    #[serde(rename = "resultMsg", default)]
    result_msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct MolitBody<T> {
    items: Option<MolitItems<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct MolitItems<T> {
    #[serde(default)]
    item: Vec<T>,
}

/// MOLIT apartment trade row
#[derive(Debug, Deserialize)]
struct TradeItem {
    #[serde(rename = "aptNm")]
    apt_nm: Option<String>,

    #[serde(rename = "umdNm")]
    umd_nm: Option<String>,

    jibun: Option<String>,

    #[serde(rename = "dealAmount")]
    deal_amount: Option<String>, // "82,500" in units of 10,000 KRW

    #[serde(rename = "dealYear")]
    deal_year: Option<String>,

    #[serde(rename = "dealMonth")]
    deal_month: Option<String>,

    #[serde(rename = "dealDay")]
    deal_day: Option<String>,

    #[serde(rename = "buildYear")]
    build_year: Option<String>,

    #[serde(rename = "excluUseAr")]
    area: Option<String>,

    floor: Option<String>,
}

/// MOLIT apartment lease row
#[derive(Debug, Deserialize)]
struct RentItem {
    #[serde(rename = "aptNm")]
    apt_nm: Option<String>,

    #[serde(rename = "umdNm")]
    umd_nm: Option<String>,

    deposit: Option<String>,

    #[serde(rename = "monthlyRent")]
    monthly_rent: Option<String>,

    #[serde(rename = "dealYear", alias = "contractYear")]
    contract_year: Option<String>,

    #[serde(rename = "dealMonth", alias = "contractMonth")]
    contract_month: Option<String>,

    #[serde(rename = "dealDay", alias = "contractDay")]
    contract_day: Option<String>,

    #[serde(rename = "buildYear")]
    build_year: Option<String>,

    #[serde(rename = "excluUseAr")]
    area: Option<String>,
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn decode_molit<T: DeserializeOwned>(raw: &RawData) -> Result<Vec<T>> {
    let xml = raw.as_xml()?;
    let envelope: MolitEnvelope<T> = quick_xml::de::from_str(xml)?;

    // "00" and "000" both mean success depending on the endpoint generation
    let code = envelope.header.result_code.trim();
    if code != "00" && code != "000" {
        return Err(anyhow::anyhow!(
            "MOLIT API error (code: {}): {}",
            code,
            envelope.header.result_msg
        ));
    }

    Ok(envelope
        .body
        .and_then(|body| body.items)
        .map(|items| items.item)
        .unwrap_or_default())
}

/// Parse a MOLIT trade response into RawDeal records
pub fn parse_molit_trades(raw: &RawData, code: &LawdCode) -> Result<Vec<RawDeal>> {
    let items: Vec<TradeItem> = decode_molit(raw)?;
    let total = items.len();

    let deals: Vec<RawDeal> = items
        .into_iter()
        .filter_map(|item| {
            let deal_amount = item.deal_amount.as_deref().and_then(parse_amount)?;
            Some(RawDeal {
                apt_name: text(item.apt_nm),
                dong: text(item.umd_nm),
                jibun: text(item.jibun),
                build_year: text(item.build_year),
                deal_amount,
                area: parse_area(item.area.as_deref()),
                floor: item
                    .floor
                    .as_deref()
                    .and_then(|f| f.trim().parse().ok())
                    .unwrap_or(0),
                deal_year: text(item.deal_year),
                deal_month: text(item.deal_month),
                deal_day: text(item.deal_day),
                lawd_code: code.to_string(),
            })
        })
        .collect();

    if deals.len() < total {
        warn!(
            "Dropped {} trade rows without a readable amount",
            total - deals.len()
        );
    }
    info!("Parsed {} trade records for {}", deals.len(), code);

    Ok(deals)
}

/// Parse a MOLIT rent response into RentDeal records
pub fn parse_molit_rents(raw: &RawData) -> Result<Vec<RentDeal>> {
    let items: Vec<RentItem> = decode_molit(raw)?;

    let rents: Vec<RentDeal> = items
        .into_iter()
        .filter_map(|item| {
            let deposit = item.deposit.as_deref().and_then(parse_amount)?;
            Some(RentDeal {
                apt_name: text(item.apt_nm),
                dong: text(item.umd_nm),
                deposit,
                monthly_rent: item
                    .monthly_rent
                    .as_deref()
                    .and_then(parse_amount)
                    .unwrap_or(0),
                area: parse_area(item.area.as_deref()),
                build_year: text(item.build_year),
                contract_year: text(item.contract_year),
                contract_month: text(item.contract_month),
                contract_day: text(item.contract_day),
            })
        })
        .collect();

    info!("Parsed {} rent records", rents.len());

    Ok(rents)
}

fn parse_area(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// KOSIS statistics row (only the columns we read)
#[derive(Debug, Deserialize)]
struct KosisRow {
    #[serde(rename = "C1_NM")]
    c1: Option<String>,

    #[serde(rename = "C2_NM")]
    c2: Option<String>,

    #[serde(rename = "C3_NM")]
    c3: Option<String>,

    #[serde(rename = "DT")]
    value: Option<String>,

    #[serde(rename = "PRD_DE")]
    period: Option<String>,
}

fn kosis_rows(raw: &RawData) -> Result<Vec<KosisRow>> {
    let json = raw.as_json()?;

    if json.is_array() {
        return Ok(serde_json::from_value(json.clone())?);
    }

    // Errors come back as an object: {"err": "20", "errMsg": "..."}
    let code = json.get("err").and_then(|v| v.as_str()).unwrap_or("?");
    let message = json.get("errMsg").and_then(|v| v.as_str()).unwrap_or("");
    Err(anyhow::anyhow!("KOSIS API error ({}): {}", code, message))
}

fn count_of(row: &KosisRow) -> u32 {
    let raw = row.value.as_deref().unwrap_or("");
    parse_amount(raw)
        .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        .or_else(|| raw.trim().parse::<f64>().ok().map(|v| v.max(0.0) as u32))
        .unwrap_or(0)
}

fn contains(field: &Option<String>, needle: &str) -> bool {
    field.as_deref().is_some_and(|v| v.contains(needle))
}

fn equals(field: &Option<String>, expected: &str) -> bool {
    field.as_deref().map(str::trim) == Some(expected)
}

/// Unsold units for a region: the region's "계" (total) row, latest period
pub fn parse_kosis_unsold(raw: &RawData, region: &str) -> Result<Lookup<u32>> {
    let rows = kosis_rows(raw)?;

    let latest = rows
        .iter()
        .filter(|row| contains(&row.c1, region) && equals(&row.c2, "계"))
        .max_by(|a, b| a.period.cmp(&b.period));

    Ok(latest.map(count_of).into())
}

/// Apartment construction starts for a region, summed over the returned months
pub fn parse_kosis_construction(raw: &RawData, region: &str) -> Result<Lookup<u32>> {
    let rows = kosis_rows(raw)?;

    let matching: Vec<&KosisRow> = rows
        .iter()
        .filter(|row| {
            equals(&row.c1, "총계") && equals(&row.c2, "총계") && contains(&row.c3, region)
        })
        .collect();

    if matching.is_empty() {
        return Ok(Lookup::NotFound);
    }

    Ok(Lookup::Found(
        matching
            .iter()
            .fold(0u32, |total, row| total.saturating_add(count_of(row))),
    ))
}

/// First geocoding candidate, if any
pub fn parse_naver_geocode(raw: &RawData) -> Result<Option<GeoPoint>> {
    let json = raw.as_json()?;

    let first = match json
        .get("addresses")
        .and_then(|a| a.as_array())
        .and_then(|a| a.first())
    {
        Some(first) => first,
        None => return Ok(None),
    };

    let coord = |key: &str| -> Option<f64> {
        let value = first.get(key)?;
        value
            .as_str()
            .and_then(|s| s.trim().parse().ok())
            .or_else(|| value.as_f64())
    };

    Ok(match (coord("y"), coord("x")) {
        (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TRADE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<response>
  <header><resultCode>000</resultCode><resultMsg>OK</resultMsg></header>
  <body>
    <items>
      <item>
        <aptNm>래미안블레스티지</aptNm><buildYear>2019</buildYear>
        <dealAmount>    245,000</dealAmount><dealDay>12</dealDay><dealMonth>3</dealMonth>
        <dealYear>2024</dealYear><excluUseAr>84.99</excluUseAr><floor>11</floor>
        <jibun>1234</jibun><umdNm>개포동</umdNm>
      </item>
      <item>
        <aptNm>개포자이</aptNm><buildYear>2004</buildYear>
        <dealAmount>n/a</dealAmount><dealDay>2</dealDay><dealMonth>3</dealMonth>
        <dealYear>2024</dealYear><excluUseAr>59.9</excluUseAr><floor>3</floor>
        <jibun>12</jibun><umdNm>개포동</umdNm>
      </item>
    </items>
    <numOfRows>100</numOfRows><pageNo>1</pageNo><totalCount>2</totalCount>
  </body>
</response>"#;

    #[test]
    fn test_parse_molit_trades() {
        let code = LawdCode::parse("11680").unwrap();
        let deals = parse_molit_trades(&RawData::Xml(TRADE_XML.to_string()), &code).unwrap();

        // Second row has no readable amount
        assert_eq!(deals.len(), 1);
        let deal = &deals[0];
        assert_eq!(deal.apt_name, "래미안블레스티지");
        assert_eq!(deal.dong, "개포동");
        assert_eq!(deal.deal_amount, 245_000);
        assert_eq!(deal.build_year, "2019");
        assert_eq!(deal.floor, 11);
        assert!((deal.area - 84.99).abs() < 1e-9);
        assert_eq!(deal.lawd_code, "11680");
    }

    #[test]
    fn test_parse_molit_error_code() {
        let xml = r#"<response><header><resultCode>30</resultCode><resultMsg>SERVICE KEY IS NOT REGISTERED</resultMsg></header></response>"#;
        let code = LawdCode::parse("11680").unwrap();

        let err = parse_molit_trades(&RawData::Xml(xml.to_string()), &code).unwrap_err();
        assert!(err.to_string().contains("code: 30"));
    }

    #[test]
    fn test_parse_molit_rents_single_item() {
        let xml = r#"<response>
  <header><resultCode>00</resultCode><resultMsg>NORMAL SERVICE.</resultMsg></header>
  <body><items><item>
    <aptNm>개포자이</aptNm><deposit>70,000</deposit><monthlyRent>0</monthlyRent>
    <dealYear>2024</dealYear><dealMonth>2</dealMonth><dealDay>5</dealDay>
    <buildYear>2004</buildYear><excluUseAr>84.5</excluUseAr><umdNm>개포동</umdNm>
  </item></items></body>
</response>"#;

        let rents = parse_molit_rents(&RawData::Xml(xml.to_string())).unwrap();
        assert_eq!(rents.len(), 1);
        assert_eq!(rents[0].deposit, 70_000);
        assert!(rents[0].is_jeonse());
        assert_eq!(rents[0].contract_month, "2");
    }

    #[test]
    fn test_parse_kosis_unsold_picks_latest_total_row() {
        let raw = RawData::Json(json!([
            {"C1_NM": "서울", "C2_NM": "계", "DT": "950", "PRD_DE": "202401"},
            {"C1_NM": "서울", "C2_NM": "계", "DT": "1020", "PRD_DE": "202403"},
            {"C1_NM": "서울", "C2_NM": "강남구", "DT": "12", "PRD_DE": "202403"},
            {"C1_NM": "경기", "C2_NM": "계", "DT": "7000", "PRD_DE": "202403"}
        ]));

        assert_eq!(parse_kosis_unsold(&raw, "서울").unwrap(), Lookup::Found(1020));
        assert_eq!(parse_kosis_unsold(&raw, "부산").unwrap(), Lookup::NotFound);
    }

    #[test]
    fn test_parse_kosis_construction_sums_months() {
        let raw = RawData::Json(json!([
            {"C1_NM": "총계", "C2_NM": "총계", "C3_NM": "서울", "DT": "1200", "PRD_DE": "202401"},
            {"C1_NM": "총계", "C2_NM": "총계", "C3_NM": "서울", "DT": "800", "PRD_DE": "202402"},
            {"C1_NM": "총계", "C2_NM": "민간", "C3_NM": "서울", "DT": "500", "PRD_DE": "202402"},
            {"C1_NM": "총계", "C2_NM": "총계", "C3_NM": "경기", "DT": "9000", "PRD_DE": "202402"}
        ]));

        assert_eq!(
            parse_kosis_construction(&raw, "서울").unwrap(),
            Lookup::Found(2000)
        );
    }

    #[test]
    fn test_parse_molit_without_items() {
        let xml = r#"<response>
  <header><resultCode>000</resultCode><resultMsg>OK</resultMsg></header>
  <body><numOfRows>100</numOfRows><pageNo>1</pageNo><totalCount>0</totalCount></body>
</response>"#;
        let code = LawdCode::parse("11680").unwrap();

        assert!(parse_molit_trades(&RawData::Xml(xml.to_string()), &code)
            .unwrap()
            .is_empty());
        assert!(parse_molit_rents(&RawData::Xml(xml.to_string()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_kosis_counts_saturate() {
        let raw = RawData::Json(json!([
            {"C1_NM": "서울", "C2_NM": "계", "DT": "5,000,000,000", "PRD_DE": "202403"},
            {"C1_NM": "총계", "C2_NM": "총계", "C3_NM": "경기", "DT": "4000000000", "PRD_DE": "202402"},
            {"C1_NM": "총계", "C2_NM": "총계", "C3_NM": "경기", "DT": "4000000000", "PRD_DE": "202403"},
            {"C1_NM": "경기", "C2_NM": "계", "DT": "-3", "PRD_DE": "202403"}
        ]));

        assert_eq!(parse_kosis_unsold(&raw, "서울").unwrap(), Lookup::Found(u32::MAX));
        assert_eq!(parse_kosis_unsold(&raw, "경기").unwrap(), Lookup::Found(0));
        assert_eq!(
            parse_kosis_construction(&raw, "경기").unwrap(),
            Lookup::Found(u32::MAX)
        );
    }

    #[test]
    fn test_parse_kosis_error_object() {
        let raw = RawData::Json(json!({"err": "20", "errMsg": "인증KEY가 유효하지 않습니다."}));
        assert!(parse_kosis_unsold(&raw, "서울").is_err());
    }

    #[test]
    fn test_parse_naver_geocode() {
        let raw = RawData::Json(json!({
            "status": "OK",
            "addresses": [{"roadAddress": "", "x": "127.0466", "y": "37.4787"}]
        }));
        let point = parse_naver_geocode(&raw).unwrap().unwrap();
        assert!((point.lat - 37.4787).abs() < 1e-9);
        assert!((point.lon - 127.0466).abs() < 1e-9);

        let empty = RawData::Json(json!({"status": "OK", "addresses": []}));
        assert_eq!(parse_naver_geocode(&empty).unwrap(), None);
    }
}
