//! In-process artifact store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::storage::StorageError;
use crate::storage::store::{ArtifactStore, validate_artifact_name};

/// Artifacts held in memory. Clones share the same contents.
///
/// Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    artifacts: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all stored artifacts, sorted.
    pub async fn names(&self) -> Vec<String> {
        self.artifacts.read().await.keys().cloned().collect()
    }

    /// Content of an artifact as UTF-8 text.
    pub async fn text(&self, name: &str) -> Option<String> {
        self.artifacts
            .read()
            .await
            .get(name)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn size(&self, name: &str) -> Result<Option<u64>, StorageError> {
        validate_artifact_name(name)?;
        Ok(self
            .artifacts
            .read()
            .await
            .get(name)
            .map(|b| b.len() as u64))
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        validate_artifact_name(name)?;
        Ok(self.artifacts.read().await.get(name).cloned())
    }

    async fn append(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_artifact_name(name)?;
        self.artifacts
            .write()
            .await
            .entry(name.to_string())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    async fn replace(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        validate_artifact_name(name)?;
        self.artifacts
            .write()
            .await
            .insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.size("a.csv").await.unwrap(), None);

        store.append("a.csv", b"x,y\n").await.unwrap();
        store.append("a.csv", b"1,2\n").await.unwrap();
        assert_eq!(store.size("a.csv").await.unwrap(), Some(8));
        assert_eq!(store.text("a.csv").await.unwrap(), "x,y\n1,2\n");

        store.replace("a.csv", b"").await.unwrap();
        assert_eq!(store.size("a.csv").await.unwrap(), Some(0));
    }

    #[tokio::test]
    async fn test_clones_share_contents() {
        let store = MemoryStore::new();
        let view = store.clone();
        store.replace("b.json", b"[]").await.unwrap();
        assert_eq!(view.names().await, vec!["b.json".to_string()]);
    }
}
