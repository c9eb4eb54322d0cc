//! Environment configuration shared by both binaries

use crate::analysis::catalog::Catalog;
use crate::analysis::pipeline::{Analyzer, AnalyzerSettings};
use crate::ingestion::cache::ResponseCache;
use crate::ingestion::fetch::NaverCredentials;
use crate::ingestion::sources::{KosisClient, MolitClient, NaverClient, Sources};
use crate::ingestion::utils::build_client;
use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub molit_api_key: Option<String>,
    pub kosis_api_key: Option<String>,
    pub naver: Option<NaverCredentials>,
    /// Per upstream request, and per enrichment lookup
    pub api_timeout: Duration,
    pub cache_ttl: Duration,
    pub host: String,
    pub port: u16,
    pub enrich_concurrency: usize,
    pub log_level: String,
}

impl Config {
    /// Read configuration from the environment (after loading `.env`)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let naver = match (optional("NAVER_CLIENT_ID"), optional("NAVER_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(NaverCredentials {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        Ok(Config {
            molit_api_key: optional("MOLIT_API_KEY"),
            kosis_api_key: optional("KOSIS_API_KEY"),
            naver,

            api_timeout: Duration::from_millis(parsed("API_TIMEOUT", 10_000)?),
            cache_ttl: Duration::from_secs(parsed("CACHE_TTL", 3_600)?),

            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parsed("PORT", 3000)?,

            enrich_concurrency: parsed("ENRICH_CONCURRENCY", 8)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    /// HTTP-backed collaborators for every upstream provider
    pub fn sources(&self, catalog: &Catalog) -> Result<Sources> {
        let client = build_client(self.api_timeout).context("Failed to build HTTP client")?;

        let kosis = Arc::new(KosisClient::new(client.clone(), self.kosis_api_key.clone()));
        Ok(Sources {
            transactions: Arc::new(MolitClient::new(client.clone(), self.molit_api_key.clone())),
            unsold: kosis.clone(),
            construction: kosis,
            transit: Arc::new(NaverClient::new(client, self.naver.clone(), catalog.stations)),
        })
    }

    /// Analyzer over cached HTTP sources
    pub fn analyzer(&self, cache: Arc<ResponseCache>) -> Result<Analyzer> {
        let catalog = Catalog::standard();
        let sources = self.sources(&catalog)?.cached(cache);
        let settings = AnalyzerSettings {
            enrich_concurrency: self.enrich_concurrency.max(1),
            lookup_timeout: self.api_timeout,
            ..AnalyzerSettings::default()
        };
        Ok(Analyzer::new(catalog, sources, settings))
    }
}

/// `RUST_LOG` when set, otherwise the configured level
pub fn init_tracing(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(log_level)
            .with_context(|| format!("Invalid log level '{}'", log_level))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialise tracing: {}", e))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parsed<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}
