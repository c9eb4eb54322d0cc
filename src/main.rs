use anyhow::{Context, Result};
use apt_invest::api::{router, AppState};
use apt_invest::config::{init_tracing, Config};
use apt_invest::ingestion::cache::{spawn_sweeper, ResponseCache};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level)?;

    info!("🏠 Starting apartment investment API server...");
    if config.molit_api_key.is_none() {
        warn!("MOLIT_API_KEY not set - transaction lookups will return nothing");
    }
    if config.naver.is_none() {
        info!("Naver credentials not set - transit and commute use defaults");
    }

    let cache = Arc::new(ResponseCache::new(config.cache_ttl));
    spawn_sweeper(cache.clone());

    let analyzer = config.analyzer(cache)?;
    let app = router(AppState {
        analyzer: Arc::new(analyzer),
    });

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("🚀 Server running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
