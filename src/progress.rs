//! Per-job progress reporting.
//!
//! A [`ProgressReporter`] is an explicit capability handed down through every
//! pipeline stage, not process-global state: concurrent jobs in one process
//! each hold their own reporter and cannot cross-report.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::contract::StatusStore;
use crate::job::{JobRecord, JobStage, ProgressCounters, ProgressEvent};

/// Single-writer progress channel for one job.
///
/// Holds the job's working record and persists it to the status store on each
/// update. Persistence is fire-and-forget: a failure to write a progress
/// update is logged and swallowed, never aborting the pipeline.
#[derive(Clone)]
pub struct ProgressReporter {
    store: Arc<dyn StatusStore>,
    record: Arc<Mutex<JobRecord>>,
}

impl ProgressReporter {
    pub fn new(store: Arc<dyn StatusStore>, record: JobRecord) -> Self {
        Self {
            store,
            record: Arc::new(Mutex::new(record)),
        }
    }

    /// Advance the job's stage/message, merge counters, and persist.
    pub async fn update(&self, stage: JobStage, message: &str, counters: ProgressCounters) {
        let snapshot = {
            let mut record = self.record.lock().await;
            if !record.advance(stage, message) {
                return;
            }
            record.counters.merge(counters);
            record.clone()
        };
        info!(
            job_id = %snapshot.job_id,
            stage = %snapshot.stage,
            "{}", snapshot.message
        );
        self.persist(&snapshot).await;
    }

    /// Consume an event emitted by a pipeline component.
    pub async fn consume(&self, event: ProgressEvent) {
        self.update(event.stage, &event.message, event.counters).await;
    }

    /// Record the terminal completed state with its result payload.
    pub async fn complete(
        &self,
        message: &str,
        counters: ProgressCounters,
        result: Vec<crate::summarize::SummaryDocument>,
        result_url: String,
    ) -> JobRecord {
        let snapshot = {
            let mut record = self.record.lock().await;
            if record.advance(JobStage::Completed, message) {
                record.counters.merge(counters);
                record.result = Some(result);
                record.result_url = Some(result_url);
            }
            record.clone()
        };
        self.persist(&snapshot).await;
        snapshot
    }

    /// Record the terminal failed state with a rendered error message.
    pub async fn fail(&self, error: &str) -> JobRecord {
        let snapshot = {
            let mut record = self.record.lock().await;
            if record.advance(JobStage::Failed, error) {
                record.error = Some(error.to_string());
            }
            record.clone()
        };
        self.persist(&snapshot).await;
        snapshot
    }

    /// The job id this reporter writes for.
    pub async fn job_id(&self) -> String {
        self.record.lock().await.job_id.clone()
    }

    async fn persist(&self, record: &JobRecord) {
        if let Err(e) = self.store.put_record(&record.job_id, record).await {
            warn!(
                job_id = %record.job_id,
                error = %e,
                "Failed to persist progress update"
            );
        }
    }
}
