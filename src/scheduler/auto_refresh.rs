//! Passive auto-refresh scheduler
//!
//! Re-runs the snapshot fetch path on the cache-TTL cadence so the
//! dashboard stays warm without user interaction. The tick goes through
//! the same fetch coordinator as every other caller, so it can never
//! race a manual refresh into a duplicate network request.

use crate::services::MarketDataService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{info, warn};

/// Background task keeping the snapshot cache warm
pub struct AutoRefreshScheduler {
    market: Arc<MarketDataService>,
    interval: Duration,
}

/// Stops the scheduler loop when told to (or when dropped).
pub struct SchedulerHandle {
    stop: Arc<Notify>,
}

impl SchedulerHandle {
    pub fn stop(&self) {
        self.stop.notify_waiters();
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop.notify_waiters();
    }
}

impl AutoRefreshScheduler {
    pub fn new(market: Arc<MarketDataService>, interval: Duration) -> Self {
        Self { market, interval }
    }

    /// Spawn the refresh loop on the current runtime.
    pub fn start(self) -> SchedulerHandle {
        let stop = Arc::new(Notify::new());
        let stop_signal = stop.clone();

        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "auto-refresh scheduler started");
            loop {
                tokio::select! {
                    _ = stop_signal.notified() => {
                        info!("auto-refresh scheduler stopped");
                        return;
                    }
                    _ = tokio::time::sleep(self.interval) => {}
                }

                if let Err(e) = self.market.fetch_market_data().await {
                    warn!(error = %e, "scheduled market data refresh failed");
                }
            }
        });

        SchedulerHandle { stop }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{
        RefreshStatus, RefreshTriggerResponse, TickerDetail, TickerSearchResult,
    };
    use crate::api::MarketApi;
    use crate::cache::SnapshotCache;
    use crate::error::Result;
    use crate::models::Snapshot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketApi for CountingApi {
        async fn fetch_snapshot(&self) -> Result<Snapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let stock = serde_json::from_value(serde_json::json!({
                "symbol": "ABC",
                "price": 10.0,
            }))
            .unwrap();
            Ok(Snapshot::from(vec![stock]))
        }

        async fn trigger_refresh(&self) -> Result<RefreshTriggerResponse> {
            unimplemented!()
        }
        async fn refresh_status(&self) -> Result<RefreshStatus> {
            unimplemented!()
        }
        async fn list_tickers(&self) -> Result<Vec<String>> {
            unimplemented!()
        }
        async fn ticker_details(&self, _symbol: &str) -> Result<TickerDetail> {
            unimplemented!()
        }
        async fn add_ticker(&self, _symbol: &str) -> Result<()> {
            unimplemented!()
        }
        async fn remove_ticker(&self, _symbol: &str) -> Result<()> {
            unimplemented!()
        }
        async fn search_tickers(&self, _query: &str) -> Result<Vec<TickerSearchResult>> {
            unimplemented!()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_the_configured_interval() {
        let api = Arc::new(CountingApi {
            calls: AtomicUsize::new(0),
        });
        // Zero TTL so every tick goes to the network.
        let cache = Arc::new(SnapshotCache::new(Duration::ZERO));
        let market = Arc::new(MarketDataService::new(api.clone(), cache));

        let handle = AutoRefreshScheduler::new(market, Duration::from_secs(300)).start();

        tokio::time::sleep(Duration::from_secs(650)).await;
        handle.stop();
        tokio::task::yield_now().await;

        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }
}
