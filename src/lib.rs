//! stockdash-core - Data coordination layer for the stock dashboard
//!
//! The single path between dashboard UI views and the market-data
//! backend: a TTL'd snapshot cache, a deduplicating fetch coordinator
//! with stale fallback, the long-running refresh workflow, and the
//! watch-list client.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;

pub use config::AppConfig;
pub use error::{AppError, ErrorResponse, Result};
pub use models::{Snapshot, Stock};
pub use state::AppState;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for embedders that don't bring their own
/// subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockdash_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
