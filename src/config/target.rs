//! Storage target configuration.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rotation::{ArtifactName, RotationPolicy};
use crate::storage::{
    ArtifactStore, ArtifactTarget, Format, LocalStore, MemoryStore, StorageTarget, TableSink,
    validate_artifact_name, validate_table_name,
};

use super::validation::{ConfigError, expand_env_vars, parse_timezone};

/// Artifact store backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Files under a root directory.
    Local { root: PathBuf },
    /// In-process only; contents are lost on exit.
    Memory,
}

impl StoreConfig {
    fn build(&self) -> Arc<dyn ArtifactStore> {
        match self {
            Self::Local { root } => Arc::new(LocalStore::new(root)),
            Self::Memory => Arc::new(MemoryStore::new()),
        }
    }
}

/// Artifact target settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub name: String,
    pub store: StoreConfig,
    /// Artifact name prefix, may contain `/` separators.
    pub prefix: String,
    pub format: Format,
    /// Size rotation threshold in bytes.
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// IANA timezone for one artifact per calendar day.
    #[serde(default)]
    pub per_day: Option<String>,
    /// Fixed CSV column order.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Table target settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub name: String,
    /// sqlx SQLite URL, e.g. `sqlite:data/recorder.db?mode=rwc`.
    pub url: String,
    pub table: String,
}

/// One persistence target of a recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetConfig {
    Artifact(ArtifactConfig),
    Table(TableConfig),
}

impl TargetConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Artifact(a) => &a.name,
            Self::Table(t) => &t.name,
        }
    }

    /// Check the settings without opening anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| ConfigError::ValidationError(format!("target '{}': {msg}", self.name()));
        if self.name().trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "target name cannot be empty".to_string(),
            ));
        }
        match self {
            Self::Artifact(a) => {
                if a.prefix.trim().is_empty() {
                    return Err(invalid("prefix cannot be empty".to_string()));
                }
                let artifact = ArtifactName::new(a.prefix.as_str(), a.format.extension());
                validate_artifact_name(&artifact.to_string())
                    .map_err(|e| invalid(format!("bad prefix: {e}")))?;
                if a.max_bytes == Some(0) {
                    return Err(invalid("max_bytes must be positive".to_string()));
                }
                if let Some(tz) = &a.per_day {
                    parse_timezone(tz).map_err(invalid)?;
                }
                if let Some(columns) = &a.columns
                    && columns.is_empty()
                {
                    return Err(invalid("columns cannot be empty when set".to_string()));
                }
            }
            Self::Table(t) => {
                validate_table_name(&t.table).map_err(|e| invalid(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// Open the target. Table targets connect to their database here.
    pub async fn build(&self, now: DateTime<Utc>) -> Result<StorageTarget, ConfigError> {
        self.validate()?;
        match self {
            Self::Artifact(a) => {
                let mut policy = RotationPolicy::none();
                if let Some(max_bytes) = a.max_bytes {
                    policy = policy.with_max_bytes(max_bytes);
                }
                if let Some(tz) = &a.per_day {
                    policy = policy.with_daily(parse_timezone(tz).map_err(ConfigError::ValidationError)?);
                }
                let mut target = ArtifactTarget::new(
                    &a.name,
                    a.store.build(),
                    &a.prefix,
                    a.format,
                    policy,
                    now,
                );
                if let Some(columns) = &a.columns {
                    target = target.with_columns(columns.clone());
                }
                tracing::debug!(
                    target = %a.name,
                    location = %target.store().location(),
                    artifact = %target.current(),
                    "Artifact target ready"
                );
                Ok(StorageTarget::Artifact(target))
            }
            Self::Table(t) => {
                let sink = TableSink::connect(&expand_env_vars(&t.url), &t.table).await?;
                Ok(StorageTarget::Table {
                    name: t.name.clone(),
                    sink,
                })
            }
        }
    }
}
