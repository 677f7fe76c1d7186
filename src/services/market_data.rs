//! Market Data Service
//!
//! The single authorized path for obtaining a market snapshot. Serves
//! from the cache when fresh, deduplicates concurrent network fetches
//! through a shared in-flight future, and prefers stale data over an
//! error whenever any previous snapshot exists.

use crate::api::MarketApi;
use crate::cache::SnapshotCache;
use crate::error::{AppError, Result};
use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome shared by every caller attached to one network fetch.
/// `AppError` is not `Clone`, so failures travel behind an `Arc`.
type SharedFetch = Shared<BoxFuture<'static, std::result::Result<Snapshot, Arc<AppError>>>>;

/// Fetch coordinator for market snapshots
pub struct MarketDataService {
    api: Arc<dyn MarketApi>,
    cache: Arc<SnapshotCache>,
    inflight: Mutex<Option<SharedFetch>>,
}

impl MarketDataService {
    pub fn new(api: Arc<dyn MarketApi>, cache: Arc<SnapshotCache>) -> Self {
        Self {
            api,
            cache,
            inflight: Mutex::new(None),
        }
    }

    /// Get the current market snapshot.
    ///
    /// Cache-hit path performs zero I/O. On a miss, concurrent callers
    /// collapse onto one outbound request and all observe its result.
    /// A failed fetch falls back to any previously cached snapshot,
    /// stale or not; the error only propagates when the cache is empty.
    pub async fn fetch_market_data(&self) -> Result<Snapshot> {
        if self.cache.is_valid() {
            if let Some(snapshot) = self.cache.get() {
                debug!(count = snapshot.len(), "serving snapshot from cache");
                return Ok(snapshot);
            }
        }

        let fetch = {
            let mut slot = self.inflight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("attaching to in-flight market data fetch");
                    existing.clone()
                }
                None => {
                    let fut = Self::fetch_and_cache(self.api.clone(), self.cache.clone())
                        .boxed()
                        .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };

        let result = fetch.clone().await;

        // Whoever finishes first retires the handle; `ptr_eq` keeps a
        // fetch installed by a later caller untouched.
        {
            let mut slot = self.inflight.lock();
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&fetch)) {
                *slot = None;
            }
        }

        result.map_err(|e| replay_error(&e))
    }

    /// When the cached snapshot's data was collected.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.cache.last_updated()
    }

    /// Last-known snapshot without touching the network, stale included.
    pub fn cached_snapshot(&self) -> Option<Snapshot> {
        self.cache.get()
    }

    /// The one network round-trip behind a cache miss. Validates the
    /// payload before the cache sees it, then applies stale fallback.
    async fn fetch_and_cache(
        api: Arc<dyn MarketApi>,
        cache: Arc<SnapshotCache>,
    ) -> std::result::Result<Snapshot, Arc<AppError>> {
        let fetched = async {
            let snapshot = api.fetch_snapshot().await?;
            snapshot.validate()?;
            Ok::<_, AppError>(snapshot)
        }
        .await;

        match fetched {
            Ok(snapshot) => {
                info!(count = snapshot.len(), "market data fetched");
                cache.put(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => match cache.get() {
                Some(stale) => {
                    warn!(error = %e, "market data fetch failed, serving stale snapshot");
                    Ok(stale)
                }
                None => {
                    error!(error = %e, "market data fetch failed with empty cache");
                    Err(Arc::new(e))
                }
            },
        }
    }
}

/// Rebuild an error observed through the shared fetch so each waiter
/// gets an owned value. Transport errors lose their `reqwest` source
/// and surface as status-less `Network` errors.
fn replay_error(err: &AppError) -> AppError {
    match err {
        AppError::Network { status, body } => AppError::Network {
            status: *status,
            body: body.clone(),
        },
        AppError::Http(e) => AppError::Network {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        },
        AppError::Validation(m) => AppError::Validation(m.clone()),
        AppError::Protocol(m) => AppError::Protocol(m.clone()),
        other => AppError::Internal(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{
        RefreshStatus, RefreshTriggerResponse, TickerDetail, TickerSearchResult,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted backend: serves a fixed snapshot or a fixed failure,
    /// counting snapshot requests.
    struct ScriptedApi {
        snapshot: std::result::Result<Snapshot, String>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl ScriptedApi {
        fn serving(snapshot: Snapshot) -> Self {
            Self {
                snapshot: Ok(snapshot),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                snapshot: Err(message.to_string()),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketApi for ScriptedApi {
        async fn fetch_snapshot(&self) -> Result<Snapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.snapshot {
                Ok(s) => Ok(s.clone()),
                Err(m) => Err(AppError::Network {
                    status: Some(500),
                    body: m.clone(),
                }),
            }
        }

        async fn trigger_refresh(&self) -> Result<RefreshTriggerResponse> {
            unimplemented!("not exercised here")
        }

        async fn refresh_status(&self) -> Result<RefreshStatus> {
            unimplemented!("not exercised here")
        }

        async fn list_tickers(&self) -> Result<Vec<String>> {
            unimplemented!("not exercised here")
        }

        async fn ticker_details(&self, _symbol: &str) -> Result<TickerDetail> {
            unimplemented!("not exercised here")
        }

        async fn add_ticker(&self, _symbol: &str) -> Result<()> {
            unimplemented!("not exercised here")
        }

        async fn remove_ticker(&self, _symbol: &str) -> Result<()> {
            unimplemented!("not exercised here")
        }

        async fn search_tickers(&self, _query: &str) -> Result<Vec<TickerSearchResult>> {
            unimplemented!("not exercised here")
        }
    }

    fn snapshot(symbol: &str, price: f64) -> Snapshot {
        let stock = serde_json::from_value(serde_json::json!({
            "symbol": symbol,
            "price": price,
        }))
        .unwrap();
        Snapshot::from(vec![stock])
    }

    fn service(api: Arc<ScriptedApi>, ttl: Duration) -> MarketDataService {
        MarketDataService::new(api, Arc::new(SnapshotCache::new(ttl)))
    }

    #[tokio::test]
    async fn cache_hit_skips_the_network() {
        let api = Arc::new(ScriptedApi::serving(snapshot("ABC", 10.5)));
        let svc = service(api.clone(), Duration::from_secs(300));

        svc.fetch_market_data().await.unwrap();
        svc.fetch_market_data().await.unwrap();

        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_cold_calls_share_one_request() {
        let mut api = ScriptedApi::serving(snapshot("ABC", 10.5));
        api.delay = Duration::from_millis(50);
        let api = Arc::new(api);
        let svc = Arc::new(service(api.clone(), Duration::from_secs(300)));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = svc.clone();
            handles.push(tokio::spawn(async move { svc.fetch_market_data().await }));
        }
        for handle in handles {
            let got = handle.await.unwrap().unwrap();
            assert_eq!(got.stocks[0].symbol, "ABC");
        }

        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn stale_snapshot_beats_a_failed_fetch() {
        let cache = Arc::new(SnapshotCache::new(Duration::ZERO));
        cache.put(snapshot("OLD", 1.0));

        let api = Arc::new(ScriptedApi::failing("backend down"));
        let svc = MarketDataService::new(api, cache);

        let got = svc.fetch_market_data().await.unwrap();
        assert_eq!(got.stocks[0].symbol, "OLD");
    }

    #[tokio::test]
    async fn empty_cache_propagates_the_error() {
        let api = Arc::new(ScriptedApi::failing("backend down"));
        let svc = service(api, Duration::from_secs(300));

        let err = svc.fetch_market_data().await.unwrap_err();
        assert!(matches!(err, AppError::Network { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn invalid_payload_leaves_cache_untouched() {
        let mut bad = snapshot("XYZ", 1.0);
        bad.stocks[0].symbol = String::new();

        let api = Arc::new(ScriptedApi::serving(bad));
        let svc = service(api, Duration::from_secs(300));

        let err = svc.fetch_market_data().await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(svc.cached_snapshot().is_none());
    }
}
