//! Recorder registry for running several recorders side by side.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::recorder::Recorder;

/// How long shutdown waits before reporting recorders still busy with a tick.
pub const SHUTDOWN_WARN_AFTER: Duration = Duration::from_secs(5);

/// Metadata about a running recorder.
#[derive(Debug, Clone)]
pub struct JobInfo {
    /// Recorder name.
    pub name: String,
    /// Schedule description.
    pub schedule: String,
}

struct Job {
    info: JobInfo,
    handle: JoinHandle<Recorder>,
}

/// Runs each recorder in its own tokio task until shutdown.
///
/// Recorders share nothing but the cancellation token.
pub struct RecorderRegistry {
    cancel: CancellationToken,
    jobs: Vec<Job>,
}

impl RecorderRegistry {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            jobs: Vec::new(),
        }
    }

    /// Token cancelled on shutdown.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn a recorder's continuous loop.
    pub fn spawn(&mut self, mut recorder: Recorder) {
        let info = JobInfo {
            name: recorder.name().to_string(),
            schedule: recorder.schedule().to_string(),
        };
        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(async move {
            recorder.run_continuous(cancel).await;
            recorder
        });
        tracing::info!(recorder = %info.name, schedule = %info.schedule, "Recorder registered");
        self.jobs.push(Job { info, handle });
    }

    pub fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.iter().map(|j| j.info.clone()).collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Cancel every recorder and wait for each to finish its tick and disconnect.
    ///
    /// In-flight ticks are never aborted; recorders still running after
    /// [`SHUTDOWN_WARN_AFTER`] are logged and then awaited.
    pub async fn shutdown(self) {
        let job_count = self.jobs.len();
        self.cancel.cancel();

        for job in self.jobs {
            let Job { info, mut handle } = job;
            let result = match tokio::time::timeout(SHUTDOWN_WARN_AFTER, &mut handle).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(recorder = %info.name, "Recorder still finishing a tick");
                    handle.await
                }
            };
            match result {
                Ok(recorder) => recorder.close().await,
                Err(e) => {
                    tracing::error!(recorder = %info.name, error = %e, "Recorder task failed");
                }
            }
        }

        tracing::info!(job_count, "Recorder registry shutdown complete");
    }
}

impl Default for RecorderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecorderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderRegistry")
            .field("job_count", &self.jobs.len())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordBatch;
    use crate::rotation::RotationPolicy;
    use crate::schedule::ScheduleSpec;
    use crate::source::{MarketSource, SourceError};
    use crate::storage::{ArtifactTarget, Format, MemoryStore, StorageTarget};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Arc;

    struct EmptySource;

    #[async_trait]
    impl MarketSource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }
        async fn connect(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
        async fn fetch(&mut self, _: &[String]) -> Result<RecordBatch, SourceError> {
            Ok(RecordBatch::empty())
        }
        async fn disconnect(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    fn recorder(name: &str, store: &MemoryStore) -> Recorder {
        let target = ArtifactTarget::new(
            name,
            Arc::new(store.clone()),
            name,
            Format::Json,
            RotationPolicy::none(),
            Utc::now(),
        );
        Recorder::new(
            name,
            vec!["SPY".into()],
            Box::new(EmptySource),
            ScheduleSpec::interval(Duration::from_secs(10)),
            vec![StorageTarget::Artifact(target)],
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_and_shutdown() {
        let store = MemoryStore::new();
        let mut registry = RecorderRegistry::new();
        registry.spawn(recorder("trades", &store));
        registry.spawn(recorder("quotes", &store));
        assert_eq!(registry.job_count(), 2);
        assert_eq!(registry.list_jobs()[1].name, "quotes");

        tokio::time::sleep(Duration::from_secs(15)).await;
        let token = registry.cancellation_token();
        registry.shutdown().await;

        assert!(token.is_cancelled());
        assert_eq!(store.names().await, vec!["quotes.json", "trades.json"]);
    }
}
