//! Ticker Service
//!
//! Watch-list management for the dashboard. Thin pass-through over the
//! backend's ticker CRUD and search endpoints so UI views never touch
//! the network directly.

use crate::api::types::{TickerDetail, TickerSearchResult};
use crate::api::MarketApi;
use crate::error::{AppError, Result};
use std::sync::Arc;
use tracing::info;

/// Watch-list service
pub struct TickerService {
    api: Arc<dyn MarketApi>,
}

impl TickerService {
    pub fn new(api: Arc<dyn MarketApi>) -> Self {
        Self { api }
    }

    /// Symbols currently tracked by the backend.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.api.list_tickers().await
    }

    /// Stored details for one tracked symbol.
    pub async fn details(&self, symbol: &str) -> Result<TickerDetail> {
        self.api.ticker_details(symbol).await
    }

    /// Add a symbol to the watch-list.
    pub async fn add(&self, symbol: &str) -> Result<()> {
        let symbol = normalize(symbol)?;
        info!(%symbol, "adding ticker to watch-list");
        self.api.add_ticker(&symbol).await
    }

    /// Remove a symbol from the watch-list.
    pub async fn remove(&self, symbol: &str) -> Result<()> {
        let symbol = normalize(symbol)?;
        info!(%symbol, "removing ticker from watch-list");
        self.api.remove_ticker(&symbol).await
    }

    /// Search tracked tickers and the upstream reference data.
    /// Queries shorter than two characters return nothing, matching
    /// the backend's own shortcut.
    pub async fn search(&self, query: &str) -> Result<Vec<TickerSearchResult>> {
        let query = query.trim();
        if query.len() < 2 {
            return Ok(Vec::new());
        }
        self.api.search_tickers(query).await
    }
}

fn normalize(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("ticker symbol is empty".to_string()));
    }
    Ok(symbol)
}
