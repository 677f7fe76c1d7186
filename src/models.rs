//! Market snapshot data model
//!
//! Mirrors the JSON records the backend serves from `/api/market-data`.
//! Fields the coordinator never interprets (news, insider trades,
//! fundamentals) are carried as opaque JSON and handed to consumers as-is.

use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Flexible Deserialization Helpers
// ============================================================================

/// Deserialize a value that could be either a string or a float
fn deserialize_string_or_float<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Int(i64),
    }

    match StringOrFloat::deserialize(deserializer)? {
        StringOrFloat::String(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrFloat::Float(f) => Ok(f),
        StringOrFloat::Int(i) => Ok(i as f64),
    }
}

/// Deserialize an optional value that could be either a string or a float
fn deserialize_optional_string_or_float<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
        Int(i64),
        Null,
    }

    match Option::<StringOrFloat>::deserialize(deserializer)? {
        Some(StringOrFloat::String(s)) if s.is_empty() => Ok(None),
        Some(StringOrFloat::String(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::Int(i)) => Ok(Some(i as f64)),
        Some(StringOrFloat::Null) | None => Ok(None),
    }
}

// ============================================================================
// Snapshot Record Types
// ============================================================================

/// Rolling volume statistics for one stock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMetrics {
    #[serde(default)]
    pub recent_volumes: Vec<f64>,
    #[serde(default)]
    pub volume_dates: Vec<String>,
    #[serde(default)]
    pub daily_changes: Vec<f64>,
    #[serde(default)]
    pub average_volume: Option<f64>,
    #[serde(default)]
    pub volume_change: Option<f64>,
    #[serde(default)]
    pub volume_vs_avg: Option<f64>,
}

/// Technical indicator summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Technicals {
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub rsi_signal: Option<String>,
    #[serde(default, rename = "volumeSMA")]
    pub volume_sma: Option<f64>,
}

/// RSI-driven alert state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalAlert {
    #[serde(default)]
    pub active: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// Per-condition alert flags backing the record's `alerts` count
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetails {
    #[serde(default)]
    pub price_alert: bool,
    #[serde(default)]
    pub volume_spike10: bool,
    #[serde(default)]
    pub volume_spike20: bool,
    #[serde(default)]
    pub high_volume: bool,
    #[serde(default)]
    pub insider_alert: bool,
    #[serde(default)]
    pub news_alert: bool,
    #[serde(default)]
    pub technical_alert: TechnicalAlert,
    #[serde(default)]
    pub near_high_alert: bool,
}

/// Company branding assets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// One stock record within a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,

    /// Collection time of this record, as emitted by the backend.
    /// RFC 3339 or `YYYY-MM-DD HH:MM:SS` (assumed UTC).
    #[serde(default)]
    pub timestamp: String,

    #[serde(deserialize_with = "deserialize_string_or_float")]
    pub price: f64,

    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub open_price: Option<f64>,
    #[serde(default)]
    pub prev_close: Option<f64>,
    #[serde(default)]
    pub day_high: Option<f64>,
    #[serde(default)]
    pub day_low: Option<f64>,

    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub prev_volume: Option<f64>,
    #[serde(default)]
    pub volume_metrics: VolumeMetrics,

    #[serde(default)]
    pub technicals: Technicals,

    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub fifty_two_week_high: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_string_or_float")]
    pub fifty_two_week_low: Option<f64>,
    #[serde(default)]
    pub high_proximity_pct: Option<f64>,

    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub branding: Branding,

    #[serde(default)]
    pub alerts: u32,
    #[serde(default)]
    pub alert_details: AlertDetails,

    // Opaque pass-through payloads rendered by the detail drawer
    #[serde(default)]
    pub insider_activity: Option<serde_json::Value>,
    #[serde(default)]
    pub recent_news: Option<serde_json::Value>,
    #[serde(default, rename = "valuation_metrics")]
    pub valuation_metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub financials: Option<serde_json::Value>,
}

impl Stock {
    /// Parse this record's collection timestamp, if well-formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// One full point-in-time pull of all tracked stocks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    pub stocks: Vec<Stock>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.stocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stocks.is_empty()
    }

    /// Structural validation of a freshly fetched payload.
    ///
    /// Every record must carry a non-empty symbol and a finite price.
    /// One bad record rejects the whole snapshot; partial acceptance
    /// would leave the dashboard mixing data from different pulls.
    pub fn validate(&self) -> Result<()> {
        for (idx, stock) in self.stocks.iter().enumerate() {
            if stock.symbol.trim().is_empty() {
                return Err(AppError::Validation(format!(
                    "record {} has an empty symbol",
                    idx
                )));
            }
            if !stock.price.is_finite() {
                return Err(AppError::Validation(format!(
                    "record {} ({}) has a non-numeric price",
                    idx, stock.symbol
                )));
            }
        }
        Ok(())
    }

    /// Latest parseable per-record collection timestamp.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.stocks.iter().filter_map(Stock::parsed_timestamp).max()
    }
}

impl From<Vec<Stock>> for Snapshot {
    fn from(stocks: Vec<Stock>) -> Self {
        Self { stocks }
    }
}
