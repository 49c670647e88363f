//! Artifact store trait.
//!
//! The narrow persistence contract every artifact backend implements. Stores
//! know nothing about formats or rotation: they hold named byte blobs.

use std::path::{Component, Path};

use async_trait::async_trait;

use crate::storage::StorageError;

/// Backend holding named artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Human-readable location (e.g. `file:///data`, `memory`).
    fn location(&self) -> String;

    /// Size of an artifact in bytes, `None` if it does not exist.
    async fn size(&self, name: &str) -> Result<Option<u64>, StorageError>;

    /// Full artifact content, `None` if it does not exist.
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Append bytes, creating the artifact if absent.
    async fn append(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Replace the artifact content, creating it if absent.
    async fn replace(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;
}

/// Validate an artifact name.
///
/// Names are relative, `/`-separated paths without `.` or `..` components.
///
/// # Errors
/// Returns `StorageError::Rejected` for empty, absolute or escaping names.
pub fn validate_artifact_name(name: &str) -> Result<(), StorageError> {
    if name.trim().is_empty() {
        return Err(StorageError::Rejected("artifact name is empty".to_string()));
    }
    if name.starts_with('/') || name.starts_with('\\') {
        return Err(StorageError::Rejected(format!(
            "artifact name '{name}' must be relative"
        )));
    }
    let escapes = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes || name.split('/').any(str::is_empty) {
        return Err(StorageError::Rejected(format!(
            "artifact name '{name}' contains an invalid path component"
        )));
    }
    Ok(())
}
