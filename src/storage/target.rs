//! Storage targets: one configured persistence destination each.
//!
//! An [`ArtifactTarget`] writes batches into named artifacts of an
//! [`ArtifactStore`] and owns the rotation state (the current artifact name).
//! A [`TableSink`] inserts rows and has no rotation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::record::RecordBatch;
use crate::rotation::{ArtifactName, Rotation, RotationPolicy};
use crate::storage::format::{Format, csv_header, encode_csv, infer_columns, merge_json};
use crate::storage::store::ArtifactStore;
use crate::storage::table::TableSink;
use crate::storage::StorageError;

/// Upper bound on generations skipped in one rotation check.
///
/// Only reached if a backend reports every probed generation as full.
const MAX_GENERATION_PROBES: u32 = 10_000;

/// A rotation check that failed part way.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RotationError {
    /// Rotation already in effect when the check failed.
    pub applied: Rotation,
    pub source: StorageError,
}

/// A persistence destination selected at construction.
#[derive(Debug)]
pub enum StorageTarget {
    /// Named artifacts with optional rotation.
    Artifact(ArtifactTarget),
    /// Row insertion into a database table.
    Table { name: String, sink: TableSink },
}

impl StorageTarget {
    /// Configured target name.
    pub fn name(&self) -> &str {
        match self {
            Self::Artifact(t) => t.name(),
            Self::Table { name, .. } => name,
        }
    }

    /// Where the next batch will be written.
    pub fn destination(&self) -> String {
        match self {
            Self::Artifact(t) => t.current().to_string(),
            Self::Table { sink, .. } => format!("table:{}", sink.table()),
        }
    }

    /// Apply the rotation policy. Table targets never rotate.
    pub async fn rotate(&mut self, now: DateTime<Utc>) -> Result<Rotation, RotationError> {
        match self {
            Self::Artifact(t) => t.rotate(now).await,
            Self::Table { .. } => Ok(Rotation::Unchanged),
        }
    }

    /// Persist a batch. Returns the number of records written.
    pub async fn persist(&mut self, batch: &RecordBatch) -> Result<usize, StorageError> {
        match self {
            Self::Artifact(t) => t.persist(batch).await,
            Self::Table { sink, .. } => sink.insert(batch).await,
        }
    }

    /// Release backend resources.
    pub async fn close(&self) {
        if let Self::Table { sink, .. } = self {
            sink.close().await;
        }
    }
}

/// Artifact-backed target with its own rotation state.
#[derive(Debug)]
pub struct ArtifactTarget {
    name: String,
    store: Arc<dyn ArtifactStore>,
    format: Format,
    policy: RotationPolicy,
    current: ArtifactName,
    columns: Option<Vec<String>>,
}

impl ArtifactTarget {
    /// Create a target. The initial artifact name is derived from `now`.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn ArtifactStore>,
        prefix: impl Into<String>,
        format: Format,
        policy: RotationPolicy,
        now: DateTime<Utc>,
    ) -> Self {
        let current = policy.initial_name(prefix, format.extension(), now);
        Self {
            name: name.into(),
            store,
            format,
            policy,
            current,
            columns: None,
        }
    }

    /// Fix the CSV column order instead of inferring it.
    #[must_use]
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Artifact currently written to.
    pub fn current(&self) -> &ArtifactName {
        &self.current
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Rotation check, run before every write.
    ///
    /// 1. Day rotation: if the current name is not dated today, switch to
    ///    generation 0 of today.
    /// 2. Size rotation: read the current size fresh from the store; at or
    ///    above the threshold, move to the next generation, skipping any
    ///    later generation that already exists and is full.
    ///
    /// A failed size check keeps the name chosen by step 1 and reports that
    /// day rotation in [`RotationError::applied`].
    pub async fn rotate(&mut self, now: DateTime<Utc>) -> Result<Rotation, RotationError> {
        if self.policy.is_noop() {
            return Ok(Rotation::Unchanged);
        }

        let mut rotation = Rotation::Unchanged;
        if let Some(next) = self.policy.date_rollover(&self.current, now) {
            tracing::info!(target = %self.name, from = %self.current, to = %next, "Day rotation");
            rotation = Rotation::NewDay {
                from: self.current.clone(),
                to: next.clone(),
            };
            self.current = next;
        }

        if self.policy.max_bytes().is_none() {
            return Ok(rotation);
        }

        match self.rotate_by_size().await {
            Ok(Some(generation)) => Ok(generation),
            Ok(None) => Ok(rotation),
            Err(source) => Err(RotationError {
                applied: rotation,
                source,
            }),
        }
    }

    async fn rotate_by_size(&mut self) -> Result<Option<Rotation>, StorageError> {
        let Some(size) = self.store.size(&self.current.to_string()).await? else {
            return Ok(None);
        };
        if !self.policy.size_exceeded(size) {
            return Ok(None);
        }

        let next = self.next_open_generation().await?;
        if let Some(seed) = self.format.seed()
            && self.store.size(&next.to_string()).await?.is_none()
        {
            self.store.replace(&next.to_string(), seed).await?;
        }

        tracing::info!(
            target = %self.name,
            from = %self.current,
            to = %next,
            size,
            "Size rotation"
        );
        let from = std::mem::replace(&mut self.current, next.clone());
        Ok(Some(Rotation::NextGeneration { from, to: next }))
    }

    /// First generation after the current one that is absent or below the threshold.
    async fn next_open_generation(&self) -> Result<ArtifactName, StorageError> {
        let mut candidate = self.current.next_generation();
        for _ in 0..MAX_GENERATION_PROBES {
            match self.store.size(&candidate.to_string()).await? {
                Some(size) if self.policy.size_exceeded(size) => {
                    candidate = candidate.next_generation();
                }
                _ => return Ok(candidate),
            }
        }
        Err(StorageError::Rejected(format!(
            "no open generation after {} within {MAX_GENERATION_PROBES} probes",
            self.current
        )))
    }

    /// Write a batch into the current artifact.
    pub async fn persist(&mut self, batch: &RecordBatch) -> Result<usize, StorageError> {
        let artifact = self.current.to_string();
        match self.format {
            Format::Json => {
                let existing = self.store.read(&artifact).await?;
                let document = merge_json(existing.as_deref(), &batch.records)?;
                self.store.replace(&artifact, &document).await?;
            }
            Format::Csv => {
                let is_new = self.store.size(&artifact).await?.unwrap_or(0) == 0;
                if self.columns.is_none() {
                    self.columns = self.resolve_columns(&artifact, is_new, batch).await?;
                }
                let Some(columns) = &self.columns else {
                    tracing::debug!(target = %self.name, "No columns known yet, nothing to write");
                    return Ok(0);
                };
                let rows = encode_csv(columns, &batch.records, is_new)?;
                if !rows.is_empty() {
                    self.store.append(&artifact, &rows).await?;
                }
            }
        }

        tracing::debug!(
            target = %self.name,
            artifact = %artifact,
            records = batch.len(),
            "Batch persisted"
        );
        Ok(batch.len())
    }

    /// Column order: existing artifact header, else the first record's keys.
    async fn resolve_columns(
        &self,
        artifact: &str,
        is_new: bool,
        batch: &RecordBatch,
    ) -> Result<Option<Vec<String>>, StorageError> {
        if !is_new && let Some(existing) = self.store.read(artifact).await? {
            return csv_header(&existing);
        }
        Ok(batch.records.first().map(infer_columns))
    }
}
