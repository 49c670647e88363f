//! Source Layer
//!
//! Market-data sources polled by recorders.
//!
//! - [`MarketSource`]: Fetch contract (connect, fetch, disconnect)
//! - [`SnapshotSource`]: Alpaca-compatible multi-symbol HTTP endpoint

mod error;
mod snapshot;
mod traits;

pub use error::SourceError;
pub use snapshot::{DEFAULT_BASE_URL, SnapshotConfig, SnapshotEndpoint, SnapshotSource};
pub use traits::MarketSource;
