//! Wire types for the market-data backend

use serde::{Deserialize, Serialize};

/// Phase of the server-side refresh job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    Idle,
    Running,
    Complete,
    /// Any phase string this client does not recognize. Treated as a
    /// protocol error by the refresh workflow.
    #[serde(other)]
    Unknown,
}

/// Body of `GET /api/market-data/refresh/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub status: RefreshPhase,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_ticker: String,
    #[serde(default)]
    pub total_tickers: u64,
    #[serde(default)]
    pub processed_tickers: u64,
    #[serde(default)]
    pub error: Option<String>,
}

impl RefreshStatus {
    pub fn idle() -> Self {
        Self {
            status: RefreshPhase::Idle,
            progress: 0.0,
            current_ticker: String::new(),
            total_tickers: 0,
            processed_tickers: 0,
            error: None,
        }
    }
}

/// Body of `POST /api/market-data/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTriggerResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// One hit from `GET /api/search?query=`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerSearchResult {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default, rename = "isTracked")]
    pub is_tracked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<TickerSearchResult>,
}

/// Stored details for one tracked ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerDetail {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TickerSymbolBody<'a> {
    pub symbol: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MutationResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_status_parses_backend_body() {
        let status: RefreshStatus = serde_json::from_str(
            r#"{
                "status": "running",
                "progress": 42.5,
                "current_ticker": "ABVX",
                "total_tickers": 40,
                "processed_tickers": 17,
                "error": null
            }"#,
        )
        .unwrap();
        assert_eq!(status.status, RefreshPhase::Running);
        assert_eq!(status.processed_tickers, 17);
    }

    #[test]
    fn unrecognized_phase_maps_to_unknown() {
        let status: RefreshStatus =
            serde_json::from_str(r#"{ "status": "rebuilding" }"#).unwrap();
        assert_eq!(status.status, RefreshPhase::Unknown);
    }
}
