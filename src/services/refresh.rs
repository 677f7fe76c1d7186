//! Refresh Service
//!
//! Drives the server-side market-data refresh job: trigger it, poll its
//! status on a fixed cadence, and on completion invalidate the cache
//! and pull a fresh snapshot. The server job is the source of truth;
//! this side only mirrors its progress for the UI.

use crate::api::types::{RefreshPhase, RefreshStatus};
use crate::api::MarketApi;
use crate::cache::SnapshotCache;
use crate::error::{AppError, Result};
use crate::services::market_data::MarketDataService;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::time::sleep;
use tracing::{info, warn};

/// Local workflow state. `Triggering` and `Polling` mark a session in
/// flight; a second `refresh()` during those is rejected. Completion
/// reports through the terminal `RefreshStatus` and the workflow
/// returns to `Idle`, so a later refresh or resume can always start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Triggering,
    Polling,
    Failed,
}

/// Refresh workflow coordinator
pub struct RefreshService {
    api: Arc<dyn MarketApi>,
    cache: Arc<SnapshotCache>,
    market: Arc<MarketDataService>,
    poll_interval: Duration,
    max_polls: u32,
    state: RwLock<RefreshState>,
    progress: watch::Sender<RefreshStatus>,
    cancel_requested: AtomicBool,
    cancel_notify: Notify,
}

impl RefreshService {
    pub fn new(
        api: Arc<dyn MarketApi>,
        cache: Arc<SnapshotCache>,
        market: Arc<MarketDataService>,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Self {
        let (progress, _) = watch::channel(RefreshStatus::idle());
        Self {
            api,
            cache,
            market,
            poll_interval,
            max_polls,
            state: RwLock::new(RefreshState::Idle),
            progress,
            cancel_requested: AtomicBool::new(false),
            cancel_notify: Notify::new(),
        }
    }

    pub fn state(&self) -> RefreshState {
        *self.state.read()
    }

    /// Progress feed for the UI; updated on every status poll.
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.progress.subscribe()
    }

    /// Ask the current polling session to stop at the next opportunity.
    /// Call on component unmount; a refresh already running server-side
    /// keeps running and can be re-attached via `check_initial_status`.
    pub fn cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
        self.cancel_notify.notify_waiters();
    }

    /// Trigger the server-side refresh job.
    ///
    /// A body reporting anything but `started` fails immediately with
    /// the server's message and the polling loop is never entered.
    pub async fn refresh(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if matches!(*state, RefreshState::Triggering | RefreshState::Polling) {
                return Err(AppError::Refresh("refresh already in progress".to_string()));
            }
            *state = RefreshState::Triggering;
        }
        self.cancel_requested.store(false, Ordering::SeqCst);

        info!("triggering market data refresh");
        let trigger = match self.api.trigger_refresh().await {
            Ok(t) => t,
            Err(e) => {
                *self.state.write() = RefreshState::Failed;
                return Err(e);
            }
        };

        if trigger.status != "started" {
            let message = trigger
                .message
                .unwrap_or_else(|| format!("refresh not started (status '{}')", trigger.status));
            warn!(%message, "refresh trigger rejected");
            *self.state.write() = RefreshState::Failed;
            return Err(AppError::Refresh(message));
        }

        *self.state.write() = RefreshState::Polling;
        Ok(())
    }

    /// Trigger a refresh and drive it to completion. The one-call entry
    /// point for the dashboard's refresh button.
    pub async fn run_refresh(&self) -> Result<RefreshStatus> {
        self.refresh().await?;
        self.poll_until_complete().await
    }

    /// Poll the status endpoint until the job completes, fails, or the
    /// poll budget runs out. Each intermediate status is published on
    /// the progress channel.
    ///
    /// On completion the workflow goes back to `Idle` once the cache
    /// has been invalidated and re-fetched, so a later server-side
    /// refresh can still be picked up by `check_initial_status`.
    pub async fn poll_until_complete(&self) -> Result<RefreshStatus> {
        let result = self.poll_loop().await;

        match &result {
            Ok(_) | Err(AppError::Canceled) => *self.state.write() = RefreshState::Idle,
            Err(_) => *self.state.write() = RefreshState::Failed,
        }

        result
    }

    /// On cold start, ask the server whether a refresh is already
    /// running (e.g. one started before a page reload) and, if so,
    /// resume polling it to completion.
    pub async fn check_initial_status(&self) -> Result<RefreshStatus> {
        let status = self.api.refresh_status().await?;
        self.progress.send_replace(status.clone());

        if status.status == RefreshPhase::Running {
            let resume = {
                let mut state = self.state.write();
                if *state == RefreshState::Idle {
                    *state = RefreshState::Polling;
                    true
                } else {
                    false
                }
            };
            if resume {
                info!("resuming in-progress refresh found at startup");
                self.cancel_requested.store(false, Ordering::SeqCst);
                return self.poll_until_complete().await;
            }
        }

        Ok(status)
    }

    async fn poll_loop(&self) -> Result<RefreshStatus> {
        let cancelled = self.cancel_notify.notified();
        tokio::pin!(cancelled);

        for _ in 0..self.max_polls {
            if self.cancel_requested.load(Ordering::SeqCst) {
                info!("refresh polling canceled");
                return Err(AppError::Canceled);
            }

            // A mid-poll transport error is terminal for this session;
            // the server job may well keep running without us.
            let status = self.api.refresh_status().await?;

            // A cancel issued while that request was in flight has no
            // registered waiter to wake; honor it here instead of after
            // another full poll-interval sleep.
            if self.cancel_requested.load(Ordering::SeqCst) {
                info!("refresh polling canceled");
                return Err(AppError::Canceled);
            }

            self.progress.send_replace(status.clone());

            match status.status {
                RefreshPhase::Running => {
                    info!(
                        progress = status.progress,
                        ticker = %status.current_ticker,
                        "refresh in progress"
                    );
                }
                RefreshPhase::Complete => {
                    info!("refresh complete, invalidating cache");
                    self.cache.invalidate();
                    if let Err(e) = self.market.fetch_market_data().await {
                        warn!(error = %e, "post-refresh fetch failed, consumers will retry");
                    }
                    return Ok(status);
                }
                RefreshPhase::Idle | RefreshPhase::Unknown => {
                    return Err(AppError::Protocol(format!(
                        "unexpected refresh phase {:?} while polling",
                        status.status
                    )));
                }
            }

            tokio::select! {
                _ = &mut cancelled => {
                    info!("refresh polling canceled");
                    return Err(AppError::Canceled);
                }
                _ = sleep(self.poll_interval) => {}
            }
        }

        Err(AppError::Refresh(format!(
            "refresh did not complete within {} polls",
            self.max_polls
        )))
    }
}
