//! Job Status Facade: translates persisted job records into client-facing
//! status snapshots, plus the submission helper that mints job ids.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::contract::{BoxError, StatusStore};
use crate::job::{JobRecord, JobStage};
use crate::summarize::SummaryDocument;

/// Response after job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSubmitReceipt {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

/// Client-facing status snapshot for polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    /// queued | processing | completed | failed
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_processed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_generated: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<SummaryDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusResponse {
    fn queued(job_id: &str) -> Self {
        JobStatusResponse {
            job_id: job_id.to_string(),
            status: "queued".to_string(),
            stage: None,
            files_processed: None,
            documents_generated: None,
            result: None,
            result_url: None,
            error: None,
        }
    }
}

/// Mint a job id and register the initial queued record.
pub async fn submit_job(
    store: &dyn StatusStore,
    repo_url: &str,
) -> Result<JobSubmitReceipt, BoxError> {
    let job_id = Uuid::new_v4().to_string();
    let record = JobRecord::queued(&job_id, repo_url);
    store.put_record(&job_id, &record).await?;
    info!(job_id = %job_id, repo_url = repo_url, "Job submitted");
    Ok(JobSubmitReceipt {
        job_id,
        status: "queued".to_string(),
        message: "Job has been queued for processing".to_string(),
    })
}

/// Poll the status of `job_id`.
///
/// An identifier the store has never seen answers as `queued` rather than
/// not-found: a job accepted by the broker may not be registered yet, and a
/// false "not found" is worse for pollers than a stale "queued". The flip
/// side — a typo'd or expired id polls as queued indefinitely — is a known
/// trade-off, not a bug.
pub async fn fetch_status(
    store: &dyn StatusStore,
    job_id: &str,
) -> Result<JobStatusResponse, BoxError> {
    let record = match store.get_record(job_id).await? {
        Some(record) => record,
        None => {
            debug!(job_id = job_id, "Unknown job id, answering as queued");
            return Ok(JobStatusResponse::queued(job_id));
        }
    };

    let response = match record.stage {
        JobStage::Queued => JobStatusResponse::queued(job_id),
        JobStage::Cloning | JobStage::Analyzing | JobStage::Uploading => JobStatusResponse {
            job_id: record.job_id,
            status: "processing".to_string(),
            stage: Some(record.stage.as_str().to_string()),
            files_processed: record
                .counters
                .files_processed
                .or(record.counters.files_found),
            documents_generated: record.counters.documents_generated,
            result: None,
            result_url: None,
            error: None,
        },
        JobStage::Completed => JobStatusResponse {
            job_id: record.job_id,
            status: "completed".to_string(),
            stage: Some(record.stage.as_str().to_string()),
            files_processed: record.counters.files_processed,
            documents_generated: record.counters.documents_generated,
            result: record.result,
            result_url: record.result_url,
            error: None,
        },
        JobStage::Failed => JobStatusResponse {
            job_id: record.job_id,
            status: "failed".to_string(),
            stage: Some(record.stage.as_str().to_string()),
            files_processed: None,
            documents_generated: None,
            result: None,
            result_url: None,
            error: record.error.or_else(|| Some("Job failed".to_string())),
        },
    };
    Ok(response)
}

/// Status store backed by a process-local map, for single-process workers and
/// tests. Durable backends (Redis, SQL, ...) implement the same trait.
#[derive(Default)]
pub struct InMemoryStatusStore {
    records: Arc<RwLock<HashMap<String, JobRecord>>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn put_record(&self, job_id: &str, record: &JobRecord) -> Result<(), BoxError> {
        self.records
            .write()
            .await
            .insert(job_id.to_string(), record.clone());
        Ok(())
    }

    async fn get_record(&self, job_id: &str) -> Result<Option<JobRecord>, BoxError> {
        Ok(self.records.read().await.get(job_id).cloned())
    }
}
