//! Fetch contract between the recorder and a market-data source.

use async_trait::async_trait;

use crate::record::RecordBatch;
use crate::source::SourceError;

/// A market-data source the recorder polls.
///
/// Implementations hold their own connection state. The recorder calls
/// `connect` once before the first tick (best effort: a failed connect is
/// logged and the loop still runs), `fetch` once per tick, and `disconnect`
/// when it stops.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Establish the connection.
    async fn connect(&mut self) -> Result<(), SourceError>;

    /// Fetch one batch for `symbols`.
    ///
    /// # Errors
    /// `SourceError::NotConnected` when called before a successful `connect`,
    /// `SourceError::Unavailable` on transport or authentication failure.
    async fn fetch(&mut self, symbols: &[String]) -> Result<RecordBatch, SourceError>;

    /// Tear the connection down. Errors are logged by the caller, never fatal.
    async fn disconnect(&mut self) -> Result<(), SourceError>;
}
