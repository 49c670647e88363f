//! HTTP snapshot source for an Alpaca-compatible market-data API.
//!
//! Polls one of the multi-symbol stock endpoints and turns each symbol's
//! object into one record carrying an added `symbol` field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::record::{Record, RecordBatch};
use crate::source::{MarketSource, SourceError};

/// Default data API base URL.
pub const DEFAULT_BASE_URL: &str = "https://data.alpaca.markets";

/// Default data feed.
const DEFAULT_FEED: &str = "iex";

/// Default request timeout (10 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_feed() -> String {
    DEFAULT_FEED.to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

/// Which multi-symbol endpoint to poll.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotEndpoint {
    /// Latest trade, quote, minute bar and daily bars per symbol.
    #[default]
    Snapshots,
    /// Latest trade per symbol.
    LatestTrades,
    /// Latest quote per symbol.
    LatestQuotes,
}

impl SnapshotEndpoint {
    /// Path below the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Snapshots => "v2/stocks/snapshots",
            Self::LatestTrades => "v2/stocks/trades/latest",
            Self::LatestQuotes => "v2/stocks/quotes/latest",
        }
    }

    /// Key wrapping the per-symbol map in the response, if any.
    fn wrapper(&self) -> Option<&'static str> {
        match self {
            Self::Snapshots => None,
            Self::LatestTrades => Some("trades"),
            Self::LatestQuotes => Some("quotes"),
        }
    }
}

/// Configuration for [`SnapshotSource`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// API base URL (default: `https://data.alpaca.markets`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key id, sent as `APCA-API-KEY-ID`.
    pub key_id: String,
    /// API secret, sent as `APCA-API-SECRET-KEY`.
    pub secret_key: String,
    /// Data feed (default: `iex`).
    #[serde(default = "default_feed")]
    pub feed: String,
    /// Endpoint to poll (default: snapshots).
    #[serde(default)]
    pub endpoint: SnapshotEndpoint,
    /// Request timeout (default: 10s).
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl SnapshotConfig {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            key_id: key_id.into(),
            secret_key: secret_key.into(),
            feed: default_feed(),
            endpoint: SnapshotEndpoint::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: SnapshotEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_feed(mut self, feed: impl Into<String>) -> Self {
        self.feed = feed.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full request URL of the configured endpoint.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.path()
        )
    }
}

/// Polls an Alpaca-compatible multi-symbol endpoint.
pub struct SnapshotSource {
    name: String,
    config: SnapshotConfig,
    client: Option<Client>,
}

impl SnapshotSource {
    pub fn new(name: impl Into<String>, config: SnapshotConfig) -> Self {
        Self {
            name: name.into(),
            config,
            client: None,
        }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

impl std::fmt::Debug for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotSource")
            .field("name", &self.name)
            .field("url", &self.config.url())
            .field("endpoint", &self.config.endpoint)
            .field("connected", &self.client.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MarketSource for SnapshotSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&mut self) -> Result<(), SourceError> {
        let client = Client::builder()
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        self.client = Some(client);
        tracing::debug!(source = %self.name, url = %self.config.url(), "Source connected");
        Ok(())
    }

    async fn fetch(&mut self, symbols: &[String]) -> Result<RecordBatch, SourceError> {
        let client = self.client.as_ref().ok_or(SourceError::NotConnected)?;
        if symbols.is_empty() {
            return Ok(RecordBatch::empty());
        }

        let response = client
            .get(self.config.url())
            .header(KEY_ID_HEADER, &self.config.key_id)
            .header(SECRET_KEY_HEADER, &self.config.secret_key)
            .query(&[
                ("symbols", symbols.join(",")),
                ("feed", self.config.feed.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        let records = extract_records(self.config.endpoint, body, symbols)?;

        tracing::debug!(
            source = %self.name,
            endpoint = %self.config.endpoint,
            requested = symbols.len(),
            received = records.len(),
            "Fetched snapshot"
        );
        Ok(RecordBatch::new(records))
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        self.client = None;
        Ok(())
    }
}

/// Split a response body into one record per requested symbol.
///
/// Symbols absent from the response (or mapped to `null`) are skipped.
/// Non-object values are wrapped as `{"value": ...}`.
fn extract_records(
    endpoint: SnapshotEndpoint,
    body: Value,
    symbols: &[String],
) -> Result<Vec<Record>, SourceError> {
    let container = match endpoint.wrapper() {
        Some(key) => match body {
            Value::Object(mut map) => map
                .remove(key)
                .ok_or_else(|| SourceError::Decode(format!("response has no '{key}' field")))?,
            _ => return Err(SourceError::Decode("response is not an object".to_string())),
        },
        None => body,
    };
    let Value::Object(mut by_symbol) = container else {
        return Err(SourceError::Decode(
            "per-symbol data is not an object".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let mut record = match by_symbol.remove(symbol) {
            None | Some(Value::Null) => {
                tracing::debug!(symbol = %symbol, "Symbol missing from response");
                continue;
            }
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Record::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        record.insert("symbol".to_string(), Value::String(symbol.clone()));
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, http::HeaderMap, http::StatusCode, routing::get};
    use serde_json::json;
    use std::collections::HashMap;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = SnapshotConfig::new("key", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.feed, "iex");
        assert_eq!(config.endpoint, SnapshotEndpoint::Snapshots);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.url(), "https://data.alpaca.markets/v2/stocks/snapshots");
    }

    #[test]
    fn test_endpoint_from_yaml() {
        let config: SnapshotConfig = serde_yaml::from_str(
            "key_id: k\nsecret_key: s\nendpoint: latest_quotes\ntimeout: 3s\nbase_url: http://x/\n",
        )
        .unwrap();
        assert_eq!(config.endpoint, SnapshotEndpoint::LatestQuotes);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.url(), "http://x/v2/stocks/quotes/latest");
    }

    #[test]
    fn test_extract_snapshots_in_requested_order() {
        let body = json!({
            "VOO": { "latestTrade": { "p": 430.1 } },
            "SPY": { "latestTrade": { "p": 470.5 } },
            "QQQ": null,
        });
        let records =
            extract_records(SnapshotEndpoint::Snapshots, body, &symbols(&["SPY", "VOO", "QQQ"]))
                .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["symbol"], "SPY");
        assert_eq!(records[0]["latestTrade"]["p"], 470.5);
        assert_eq!(records[1]["symbol"], "VOO");
    }

    #[test]
    fn test_extract_wrapped_trades() {
        let body = json!({ "trades": { "SPY": { "p": 1.0, "s": 100 } } });
        let records =
            extract_records(SnapshotEndpoint::LatestTrades, body, &symbols(&["SPY"])).unwrap();
        assert_eq!(records[0]["s"], 100);
        assert_eq!(records[0]["symbol"], "SPY");
    }

    #[test]
    fn test_extract_rejects_malformed() {
        let err = extract_records(SnapshotEndpoint::LatestQuotes, json!({}), &symbols(&["SPY"]))
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));

        let err = extract_records(SnapshotEndpoint::Snapshots, json!([1, 2]), &symbols(&["SPY"]))
            .unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_before_connect() {
        let mut source = SnapshotSource::new("alpaca", SnapshotConfig::new("k", "s"));
        let err = source.fetch(&symbols(&["SPY"])).await.unwrap_err();
        assert!(matches!(err, SourceError::NotConnected));
    }

    async fn spawn_mock() -> String {
        async fn snapshots(
            headers: HeaderMap,
            Query(params): Query<HashMap<String, String>>,
        ) -> Result<Json<Value>, StatusCode> {
            if headers.get(KEY_ID_HEADER).and_then(|v| v.to_str().ok()) != Some("good") {
                return Err(StatusCode::UNAUTHORIZED);
            }
            let mut body = serde_json::Map::new();
            for symbol in params.get("symbols").into_iter().flat_map(|s| s.split(',')) {
                body.insert(
                    symbol.to_string(),
                    json!({ "feed": params.get("feed"), "dailyBar": { "c": 1.0 } }),
                );
            }
            Ok(Json(Value::Object(body)))
        }

        let app = Router::new().route("/v2/stocks/snapshots", get(snapshots));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_fetch_from_mock_server() {
        let base_url = spawn_mock().await;
        let config = SnapshotConfig::new("good", "secret").with_base_url(&base_url);
        let mut source = SnapshotSource::new("alpaca", config);

        source.connect().await.unwrap();
        let batch = source.fetch(&symbols(&["SPY", "VOO"])).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.records[1]["symbol"], "VOO");
        assert_eq!(batch.records[0]["feed"], "iex");

        source.disconnect().await.unwrap();
        assert!(!source.is_connected());
    }

    #[tokio::test]
    async fn test_fetch_unauthorized_is_unavailable() {
        let base_url = spawn_mock().await;
        let config = SnapshotConfig::new("bad", "secret").with_base_url(&base_url);
        let mut source = SnapshotSource::new("alpaca", config);

        source.connect().await.unwrap();
        let err = source.fetch(&symbols(&["SPY"])).await.unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
    }
}
