//! The recording loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::ConfigError;
use crate::record::RecordBatch;
use crate::recorder::clock::{Clock, SystemClock};
use crate::recorder::report::{FetchOutcome, TargetOutcome, TickReport};
use crate::schedule::{Cadence, ScheduleSpec, Step};
use crate::source::MarketSource;
use crate::storage::{RotationError, StorageTarget};

/// One recorder: a source, a schedule and the targets every batch goes to.
///
/// A recorder owns its targets exclusively. Ticks never overlap: fetch,
/// rotation and persistence of one tick finish before the next sleep is
/// computed.
pub struct Recorder {
    name: String,
    symbols: Vec<String>,
    source: Box<dyn MarketSource>,
    cadence: Cadence,
    targets: Vec<StorageTarget>,
    clock: Arc<dyn Clock>,
}

impl Recorder {
    /// Create a recorder.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if `symbols` or `targets` is empty.
    pub fn new(
        name: impl Into<String>,
        symbols: Vec<String>,
        source: Box<dyn MarketSource>,
        schedule: ScheduleSpec,
        targets: Vec<StorageTarget>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if symbols.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "recorder '{name}': symbols cannot be empty"
            )));
        }
        if targets.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "recorder '{name}': at least one target is required"
            )));
        }
        Ok(Self {
            name,
            symbols,
            source,
            cadence: Cadence::new(schedule),
            targets,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the wall clock used for schedule and rotation decisions.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn schedule(&self) -> &ScheduleSpec {
        self.cadence.spec()
    }

    pub fn targets(&self) -> &[StorageTarget] {
        &self.targets
    }

    /// Run ticks until `cancel` fires, then disconnect.
    ///
    /// Cancellation is observed only while sleeping; a tick in progress
    /// always completes.
    pub async fn run_continuous(&mut self, cancel: CancellationToken) {
        tracing::info!(
            recorder = %self.name,
            schedule = %self.cadence.spec(),
            symbols = self.symbols.len(),
            targets = self.targets.len(),
            "Recorder started"
        );
        self.connect().await;

        loop {
            let (delay, tick) = match self.cadence.next_step(self.clock.now()) {
                Step::Wait(delay) => (delay, false),
                Step::TickAfter(delay) => (delay, true),
            };

            if !sleep_or_cancel(delay, &cancel).await {
                break;
            }
            if tick {
                let report = self.tick().await;
                tracing::debug!(recorder = %self.name, status = %report.status(), "Tick complete");
            }
        }

        self.disconnect().await;
        tracing::info!(recorder = %self.name, "Recorder stopped");
    }

    /// Connect, run exactly one tick, disconnect.
    pub async fn run_once(&mut self) -> TickReport {
        self.connect().await;
        let report = self.tick().await;
        self.disconnect().await;
        report
    }

    /// One fetch, then rotate and persist at every target in configuration order.
    ///
    /// A fetch failure skips persistence. A failure at one target never stops
    /// the remaining targets.
    pub async fn tick(&mut self) -> TickReport {
        let started_at = self.clock.now();

        let batch = match self.source.fetch(&self.symbols).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(
                    recorder = %self.name,
                    source = %self.source.name(),
                    error = %e,
                    "Fetch failed, skipping tick"
                );
                return TickReport {
                    recorder: self.name.clone(),
                    started_at,
                    fetch: FetchOutcome::Failed {
                        error: e.to_string(),
                    },
                    targets: Vec::new(),
                };
            }
        };

        let mut outcomes = Vec::with_capacity(self.targets.len());
        for target in &mut self.targets {
            let now = self.clock.now();
            outcomes.push(store(&self.name, target, &batch, now).await);
        }

        TickReport {
            recorder: self.name.clone(),
            started_at,
            fetch: FetchOutcome::Fetched {
                records: batch.len(),
            },
            targets: outcomes,
        }
    }

    /// Release target resources. Call once the recorder is done for good.
    pub async fn close(&self) {
        for target in &self.targets {
            target.close().await;
        }
    }

    async fn connect(&mut self) {
        if let Err(e) = self.source.connect().await {
            tracing::warn!(
                recorder = %self.name,
                source = %self.source.name(),
                error = %e,
                "Connect failed, continuing unconnected"
            );
        }
    }

    async fn disconnect(&mut self) {
        if let Err(e) = self.source.disconnect().await {
            tracing::warn!(
                recorder = %self.name,
                source = %self.source.name(),
                error = %e,
                "Disconnect failed"
            );
        }
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("name", &self.name)
            .field("symbols", &self.symbols)
            .field("source", &self.source.name())
            .field("schedule", self.cadence.spec())
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}

/// Sleep for `delay` unless cancelled first. Returns `false` on cancellation.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn store(
    recorder: &str,
    target: &mut StorageTarget,
    batch: &RecordBatch,
    now: chrono::DateTime<chrono::Utc>,
) -> TargetOutcome {
    let (rotation, rotation_error) = match target.rotate(now).await {
        Ok(rotation) => (Some(rotation), None),
        Err(RotationError { applied, source }) => {
            tracing::warn!(
                recorder,
                target = %target.name(),
                error = %source,
                "Rotation check failed, keeping current artifact"
            );
            (applied.is_rotated().then_some(applied), Some(source.to_string()))
        }
    };

    let destination = target.destination();
    let (records, error) = match target.persist(batch).await {
        Ok(written) => (written, None),
        Err(e) => {
            tracing::error!(
                recorder,
                target = %target.name(),
                destination = %destination,
                unavailable = e.is_unavailable(),
                error = %e,
                "Persist failed"
            );
            (0, Some(e.to_string()))
        }
    };

    TargetOutcome {
        target: target.name().to_string(),
        destination,
        rotation,
        rotation_error,
        records,
        error,
    }
}
