//! Collaborator traits for the analysis pipeline and their HTTP-backed
//! implementations (MOLIT transactions, KOSIS statistics, Naver geocoding)

use crate::analysis::geo::{distance_between, nearest_landmark, GeoPoint, Landmark};
use crate::ingestion::fetch::{
    fetch_kosis, fetch_molit, fetch_naver_geocode, KosisTable, MolitDataset, NaverCredentials,
};
use crate::ingestion::parse::{
    parse_kosis_construction, parse_kosis_unsold, parse_molit_rents, parse_molit_trades,
    parse_naver_geocode,
};
use crate::ingestion::types::{LawdCode, Lookup, RawDeal, RentDeal, YearMonth};
use crate::ingestion::utils::FetchError;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Straight-line travel speed used for commute estimates
const COMMUTE_SPEED_KMH: f64 = 30.0;

/// How long the geocoder stays off after rejecting the credentials
const GEOCODER_BACKOFF: Duration = Duration::from_secs(5 * 60);

#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RawDeal>>;

    async fn fetch_rent_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RentDeal>>;
}

#[async_trait]
pub trait UnsoldSource: Send + Sync {
    /// Unsold housing units in a province or city
    async fn fetch_unsold(&self, region: &str) -> Result<Lookup<u32>>;
}

#[async_trait]
pub trait ConstructionSource: Send + Sync {
    /// Construction starts over the trailing three months
    async fn fetch_construction(&self, region: &str) -> Result<Lookup<u32>>;
}

#[async_trait]
pub trait TransitSource: Send + Sync {
    /// Meters from an address to the nearest major station
    async fn fetch_nearest_transit(&self, address: &str) -> Result<Lookup<u32>>;

    async fn fetch_commute_minutes(&self, from: &str, to: &str) -> Result<u32>;
}

/// Every external collaborator the analyzer consumes
#[derive(Clone)]
pub struct Sources {
    pub transactions: Arc<dyn TransactionSource>,
    pub unsold: Arc<dyn UnsoldSource>,
    pub construction: Arc<dyn ConstructionSource>,
    pub transit: Arc<dyn TransitSource>,
}

/// Apartment trade and rent records from the land ministry
pub struct MolitClient {
    client: Client,
    api_key: Option<String>,
}

impl MolitClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("MOLIT_API_KEY is not configured"))
    }
}

#[async_trait]
impl TransactionSource for MolitClient {
    async fn fetch_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RawDeal>> {
        let raw = fetch_molit(&self.client, self.key()?, MolitDataset::Trade, code, month).await?;
        parse_molit_trades(&raw, code)
    }

    async fn fetch_rent_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RentDeal>> {
        let raw = fetch_molit(&self.client, self.key()?, MolitDataset::Rent, code, month).await?;
        parse_molit_rents(&raw)
    }
}

/// Housing statistics published through KOSIS
pub struct KosisClient {
    client: Client,
    api_key: Option<String>,
}

impl KosisClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl UnsoldSource for KosisClient {
    async fn fetch_unsold(&self, region: &str) -> Result<Lookup<u32>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("KOSIS_API_KEY not configured, no unsold data for {}", region);
            return Ok(Lookup::NotFound);
        };
        let raw = fetch_kosis(&self.client, api_key, KosisTable::Unsold).await?;
        parse_kosis_unsold(&raw, region)
    }
}

#[async_trait]
impl ConstructionSource for KosisClient {
    async fn fetch_construction(&self, region: &str) -> Result<Lookup<u32>> {
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("KOSIS_API_KEY not configured, no construction data for {}", region);
            return Ok(Lookup::NotFound);
        };
        let raw = fetch_kosis(&self.client, api_key, KosisTable::Construction).await?;
        parse_kosis_construction(&raw, region)
    }
}

/// Geocoding-backed transit distance and commute estimates
pub struct NaverClient {
    client: Client,
    credentials: Option<NaverCredentials>,
    stations: &'static [Landmark],
    disabled_until: Mutex<Option<Instant>>,
}

impl NaverClient {
    pub fn new(
        client: Client,
        credentials: Option<NaverCredentials>,
        stations: &'static [Landmark],
    ) -> Self {
        Self {
            client,
            credentials,
            stations,
            disabled_until: Mutex::new(None),
        }
    }

    fn is_disabled(&self) -> bool {
        let guard = self.disabled_until.lock().unwrap_or_else(|e| e.into_inner());
        guard.map_or(false, |until| Instant::now() < until)
    }

    fn set_disabled_until(&self, until: Option<Instant>) {
        let mut guard = self.disabled_until.lock().unwrap_or_else(|e| e.into_inner());
        *guard = until;
    }

    /// Coordinates of an address; `None` when the geocoder is unavailable
    /// or found nothing
    pub async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>> {
        let Some(credentials) = &self.credentials else {
            return Ok(None);
        };
        if self.is_disabled() {
            debug!("Geocoder backing off, skipping {}", address);
            return Ok(None);
        }

        match fetch_naver_geocode(&self.client, credentials, address).await {
            Ok(raw) => {
                self.set_disabled_until(None);
                parse_naver_geocode(&raw)
            }
            Err(e) => {
                let rejected = e
                    .downcast_ref::<FetchError>()
                    .map_or(false, FetchError::is_unauthorized);
                if rejected {
                    warn!(
                        "Geocoder rejected credentials, disabling for {}s",
                        GEOCODER_BACKOFF.as_secs()
                    );
                    self.set_disabled_until(Some(Instant::now() + GEOCODER_BACKOFF));
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl TransitSource for NaverClient {
    async fn fetch_nearest_transit(&self, address: &str) -> Result<Lookup<u32>> {
        let nearest = self
            .geocode(address)
            .await?
            .and_then(|point| nearest_landmark(point, self.stations));

        Ok(match nearest {
            Some(station) => {
                debug!("{} is {:.0}m from {}", address, station.distance_m, station.name);
                Lookup::Found(station.distance_m.round() as u32)
            }
            None => Lookup::NotFound,
        })
    }

    async fn fetch_commute_minutes(&self, from: &str, to: &str) -> Result<u32> {
        let (origin, destination) = (self.geocode(from).await?, self.geocode(to).await?);
        match (origin, destination) {
            (Some(a), Some(b)) => Ok(commute_minutes(distance_between(a, b))),
            _ => bail!("could not geocode commute '{}' -> '{}'", from, to),
        }
    }
}

/// Minutes to cover a straight-line distance at commuting speed
pub fn commute_minutes(distance_m: f64) -> u32 {
    (distance_m / 1000.0 / COMMUTE_SPEED_KMH * 60.0).round() as u32
}
