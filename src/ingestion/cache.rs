//! In-memory TTL cache for upstream responses and a caching decorator for
//! every collaborator trait

use crate::ingestion::sources::{
    ConstructionSource, Sources, TransactionSource, TransitSource, UnsoldSource,
};
use crate::ingestion::types::{LawdCode, Lookup, RawDeal, RentDeal, YearMonth};
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

struct CacheEntry {
    value: serde_json::Value,
    created_at: Instant,
}

/// Key/value store where every entry expires `ttl` after it was written
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expired entries are swept at a fifth of the TTL
    pub fn sweep_interval(&self) -> Duration {
        (self.ttl / 5).max(Duration::from_millis(1))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        let fresh = entries
            .get(key)
            .map(|entry| entry.created_at.elapsed() < self.ttl)?;

        if !fresh {
            entries.remove(key);
            return None;
        }

        let entry = entries.get(key)?;
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn set<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(value) => {
                self.lock().insert(
                    key,
                    CacheEntry {
                        value,
                        created_at: Instant::now(),
                    },
                );
            }
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.created_at.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Periodically purge expired entries for the life of the process
pub fn spawn_sweeper(cache: Arc<ResponseCache>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cache.sweep_interval());
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                debug!("Cache sweep removed {} expired entries", removed);
            }
        }
    })
}

/// Read-through caching wrapper around a collaborator
pub struct Cached<S: ?Sized> {
    inner: Arc<S>,
    cache: Arc<ResponseCache>,
}

impl<S: ?Sized> Cached<S> {
    pub fn new(inner: Arc<S>, cache: Arc<ResponseCache>) -> Self {
        Self { inner, cache }
    }

    async fn read_through<T, F>(&self, key: String, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.cache.get::<T>(&key) {
            debug!("Cache hit: {}", key);
            return Ok(hit);
        }
        let value = fetch.await?;
        self.cache.set(key, &value);
        Ok(value)
    }
}

#[async_trait]
impl<S: TransactionSource + ?Sized> TransactionSource for Cached<S> {
    async fn fetch_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RawDeal>> {
        let key = format!("transaction_{}_{}", code, month);
        self.read_through(key, self.inner.fetch_deals(code, month))
            .await
    }

    async fn fetch_rent_deals(&self, code: &LawdCode, month: YearMonth) -> Result<Vec<RentDeal>> {
        let key = format!("rent_{}_{}", code, month);
        self.read_through(key, self.inner.fetch_rent_deals(code, month))
            .await
    }
}

#[async_trait]
impl<S: UnsoldSource + ?Sized> UnsoldSource for Cached<S> {
    async fn fetch_unsold(&self, region: &str) -> Result<Lookup<u32>> {
        let key = format!("unsold_{}", region);
        self.read_through(key, self.inner.fetch_unsold(region)).await
    }
}

#[async_trait]
impl<S: ConstructionSource + ?Sized> ConstructionSource for Cached<S> {
    async fn fetch_construction(&self, region: &str) -> Result<Lookup<u32>> {
        let key = format!("construction_{}", region);
        self.read_through(key, self.inner.fetch_construction(region))
            .await
    }
}

#[async_trait]
impl<S: TransitSource + ?Sized> TransitSource for Cached<S> {
    async fn fetch_nearest_transit(&self, address: &str) -> Result<Lookup<u32>> {
        let key = format!("station_{}", address);
        self.read_through(key, self.inner.fetch_nearest_transit(address))
            .await
    }

    async fn fetch_commute_minutes(&self, from: &str, to: &str) -> Result<u32> {
        let key = format!("commute_{}_{}", from, to);
        self.read_through(key, self.inner.fetch_commute_minutes(from, to))
            .await
    }
}

impl Sources {
    /// Wrap every collaborator with a read-through cache
    pub fn cached(self, cache: Arc<ResponseCache>) -> Sources {
        Sources {
            transactions: Arc::new(Cached::new(self.transactions, cache.clone())),
            unsold: Arc::new(Cached::new(self.unsold, cache.clone())),
            construction: Arc::new(Cached::new(self.construction, cache.clone())),
            transit: Arc::new(Cached::new(self.transit, cache)),
        }
    }
}
