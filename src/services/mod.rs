//! Services Layer
//!
//! Business logic between the dashboard UI and the market-data backend.
//! UI views call these services; nothing above this layer touches the
//! network.
//!
//! # Architecture
//!
//! ```text
//! Dashboard UI ──> Services ──> MarketApi (HTTP) ──> backend
//!                     │
//!                     └──> SnapshotCache
//! ```
//!
//! # Services
//!
//! - `MarketDataService` - snapshot fetching with caching and dedup
//! - `RefreshService` - server-side refresh trigger + status polling
//! - `TickerService` - watch-list CRUD and search

pub mod market_data;
pub mod refresh;
pub mod tickers;

// Re-export commonly used types and services
pub use market_data::MarketDataService;
pub use refresh::{RefreshService, RefreshState};
pub use tickers::TickerService;
