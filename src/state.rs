//! Application state management

use crate::api::{HttpMarketApi, MarketApi};
use crate::cache::SnapshotCache;
use crate::config::AppConfig;
use crate::error::Result;
use crate::scheduler::{AutoRefreshScheduler, SchedulerHandle};
use crate::services::{MarketDataService, RefreshService, TickerService};
use std::sync::Arc;

/// Application state shared across all UI entry points.
///
/// This is the composition root: everything below it is constructed
/// here and reached only through these handles. There is no module-
/// level singleton; embedders own the lifetime.
pub struct AppState {
    /// Resolved configuration
    pub config: AppConfig,

    /// Snapshot cache, owned here, mutated only by the services
    pub cache: Arc<SnapshotCache>,

    /// Snapshot fetch coordinator
    pub market: Arc<MarketDataService>,

    /// Refresh workflow coordinator
    pub refresh: Arc<RefreshService>,

    /// Watch-list service
    pub tickers: Arc<TickerService>,
}

impl AppState {
    /// Build the full service graph from a configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let api: Arc<dyn MarketApi> = Arc::new(HttpMarketApi::new(&config)?);
        Ok(Self::with_api(config, api))
    }

    /// Build the service graph over an existing API client. Tests use
    /// this to substitute a scripted backend.
    pub fn with_api(config: AppConfig, api: Arc<dyn MarketApi>) -> Self {
        let cache = Arc::new(SnapshotCache::new(config.cache_ttl));
        let market = Arc::new(MarketDataService::new(api.clone(), cache.clone()));
        let refresh = Arc::new(RefreshService::new(
            api.clone(),
            cache.clone(),
            market.clone(),
            config.refresh_poll_interval,
            config.refresh_max_polls,
        ));
        let tickers = Arc::new(TickerService::new(api));

        tracing::info!(base_url = %config.api_base_url, "application state initialized");

        Self {
            config,
            cache,
            market,
            refresh,
            tickers,
        }
    }

    /// Read configuration from the environment and build the state.
    pub fn from_env() -> Result<Self> {
        Self::new(AppConfig::from_env()?)
    }

    /// Start the passive auto-refresh loop on the cache-TTL cadence.
    pub fn start_auto_refresh(&self) -> SchedulerHandle {
        AutoRefreshScheduler::new(self.market.clone(), self.config.cache_ttl).start()
    }
}
