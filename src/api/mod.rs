//! Market-data backend client
//!
//! The `MarketApi` trait is the only seam through which the crate talks
//! to the network. Services depend on the trait so tests can substitute
//! a scripted backend.

pub mod types;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::Snapshot;
use async_trait::async_trait;
use reqwest::Client;
use types::{
    MutationResponse, RefreshStatus, RefreshTriggerResponse, SearchResponse, TickerDetail,
    TickerSearchResult, TickerSymbolBody,
};

/// Remote operations exposed by the dashboard backend
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// `GET /api/market-data`
    async fn fetch_snapshot(&self) -> Result<Snapshot>;

    /// `POST /api/market-data/refresh`
    async fn trigger_refresh(&self) -> Result<RefreshTriggerResponse>;

    /// `GET /api/market-data/refresh/status`
    async fn refresh_status(&self) -> Result<RefreshStatus>;

    /// `GET /api/tickers`
    async fn list_tickers(&self) -> Result<Vec<String>>;

    /// `GET /api/ticker-details/{symbol}`
    async fn ticker_details(&self, symbol: &str) -> Result<TickerDetail>;

    /// `POST /api/tickers`
    async fn add_ticker(&self, symbol: &str) -> Result<()>;

    /// `DELETE /api/tickers/{symbol}`
    async fn remove_ticker(&self, symbol: &str) -> Result<()>;

    /// `GET /api/search?query=`
    async fn search_tickers(&self, query: &str) -> Result<Vec<TickerSearchResult>>;
}

/// `MarketApi` over HTTP via reqwest
pub struct HttpMarketApi {
    client: Client,
    base_url: String,
}

impl HttpMarketApi {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Deserialize a 2xx response, or map a non-2xx one to `Network`.
    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Network {
                status: Some(status.as_u16()),
                body,
            });
        }
        Ok(response.json().await?)
    }

    /// Parse a snapshot body. Records that don't fit the schema (bad
    /// price, missing symbol) are a validation failure of the payload,
    /// not a transport problem.
    fn parse_snapshot(body: &str) -> Result<Snapshot> {
        serde_json::from_str(body)
            .map_err(|e| AppError::Validation(format!("malformed market data payload: {}", e)))
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn fetch_snapshot(&self) -> Result<Snapshot> {
        let response = self.client.get(self.url("/api/market-data")).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Network {
                status: Some(status.as_u16()),
                body,
            });
        }
        let body = response.text().await?;
        Self::parse_snapshot(&body)
    }

    async fn trigger_refresh(&self) -> Result<RefreshTriggerResponse> {
        let response = self
            .client
            .post(self.url("/api/market-data/refresh"))
            .send()
            .await?;

        // A busy or failed backend answers non-2xx but still ships a
        // `{status: "error", message}` body. Surface that body when it
        // parses so callers see the real reason, not just the code.
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(trigger) = serde_json::from_str::<RefreshTriggerResponse>(&body) {
            return Ok(trigger);
        }
        if !status.is_success() {
            return Err(AppError::Network {
                status: Some(status.as_u16()),
                body,
            });
        }
        Err(AppError::Protocol(format!(
            "unparseable refresh trigger response: {}",
            body
        )))
    }

    async fn refresh_status(&self) -> Result<RefreshStatus> {
        let response = self
            .client
            .get(self.url("/api/market-data/refresh/status"))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn list_tickers(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("/api/tickers")).send().await?;
        Self::read_json(response).await
    }

    async fn ticker_details(&self, symbol: &str) -> Result<TickerDetail> {
        let response = self
            .client
            .get(self.url(&format!("/api/ticker-details/{}", symbol)))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn add_ticker(&self, symbol: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/tickers"))
            .json(&TickerSymbolBody { symbol })
            .send()
            .await?;
        let result: MutationResponse = Self::read_json(response).await?;
        if !result.success {
            return Err(AppError::Internal(format!(
                "backend refused to add ticker {}",
                symbol
            )));
        }
        Ok(())
    }

    async fn remove_ticker(&self, symbol: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/tickers/{}", symbol)))
            .send()
            .await?;
        let result: MutationResponse = Self::read_json(response).await?;
        if !result.success {
            return Err(AppError::Internal(format!(
                "backend refused to remove ticker {}",
                symbol
            )));
        }
        Ok(())
    }

    async fn search_tickers(&self, query: &str) -> Result<Vec<TickerSearchResult>> {
        let response = self
            .client
            .get(self.url("/api/search"))
            .query(&[("query", query)])
            .send()
            .await?;
        let result: SearchResponse = Self::read_json(response).await?;
        Ok(result.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn url_building_strips_trailing_slash() {
        let config = AppConfig::with_base_url(Url::parse("http://localhost:8000/").unwrap());
        let api = HttpMarketApi::new(&config).unwrap();
        assert_eq!(api.url("/api/market-data"), "http://localhost:8000/api/market-data");
    }

    #[test]
    fn undecodable_snapshot_body_is_a_validation_error() {
        // Unparseable price string
        let err = HttpMarketApi::parse_snapshot(r#"[{"symbol": "ABC", "price": "abc"}]"#)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // Missing required price field
        let err = HttpMarketApi::parse_snapshot(r#"[{"symbol": "ABC"}]"#).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let snapshot =
            HttpMarketApi::parse_snapshot(r#"[{"symbol": "ABC", "price": 10.5}]"#).unwrap();
        assert_eq!(snapshot.len(), 1);
    }
}
