//! Market Recorder - scheduled market-data capture
//!
//! Polls a market-data source for a configured set of instruments and
//! durably records every batch. The library holds the recording scheduler
//! and the storage-rotation engine; the `market-recorder` binary wires them
//! to a YAML configuration, signals and an optional HTTP trigger.
//!
//! # Architecture
//!
//! - **Schedule**: When to tick (fixed interval, session windows, clock times)
//! - **Source**: Fetch contract and the Alpaca-compatible snapshot source
//! - **Rotation**: Artifact naming plus day and size rotation decisions
//! - **Storage**: Artifact stores, CSV/JSON formats and SQLite table targets
//! - **Recorder**: The tick loop with per-target failure isolation
//! - **Server**: Single-shot activation over HTTP
//!
//! # Example
//!
//! ```rust,no_run
//! use market_recorder::config::AppConfig;
//! use market_recorder::recorder::RecorderRegistry;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load("configs/recorder.yaml")?;
//! let mut registry = RecorderRegistry::new();
//! for recorder in config.build_recorders().await? {
//!     registry.spawn(recorder);
//! }
//! tokio::signal::ctrl_c().await?;
//! registry.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod record;
pub mod recorder;
pub mod rotation;
pub mod schedule;
pub mod server;
pub mod source;
pub mod storage;

pub use config::{AppConfig, ConfigError};
pub use record::{Record, RecordBatch};
pub use recorder::{Recorder, RecorderRegistry, TickReport, TickStatus};
pub use rotation::{ArtifactName, Rotation, RotationPolicy};
pub use schedule::ScheduleSpec;
pub use source::{MarketSource, SourceError};
pub use storage::{ArtifactStore, StorageError, StorageTarget};
