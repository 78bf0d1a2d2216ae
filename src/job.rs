//! Job domain types: pipeline stages, the persisted status record, progress
//! events and the terminal task outcome.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::summarize::SummaryDocument;

/// Named phase of the pipeline, surfaced to status pollers.
///
/// Transitions run strictly forward (`Queued` → `Cloning` → `Analyzing` →
/// `Uploading` → `Completed`), except that `Failed` can be reached from any
/// non-terminal stage. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Queued,
    Cloning,
    Analyzing,
    Uploading,
    Completed,
    Failed,
}

impl JobStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStage::Queued => "queued",
            JobStage::Cloning => "cloning",
            JobStage::Analyzing => "analyzing",
            JobStage::Uploading => "uploading",
            JobStage::Completed => "completed",
            JobStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-specific counters carried alongside progress updates.
///
/// `None` means "not yet known for this stage"; merging keeps the last known
/// value so later updates don't erase earlier counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressCounters {
    pub files_found: Option<u64>,
    pub files_processed: Option<u64>,
    pub documents_generated: Option<u64>,
}

impl ProgressCounters {
    /// Overlay `other` on top of `self`, keeping existing values where `other`
    /// carries none.
    pub fn merge(&mut self, other: ProgressCounters) {
        if other.files_found.is_some() {
            self.files_found = other.files_found;
        }
        if other.files_processed.is_some() {
            self.files_processed = other.files_processed;
        }
        if other.documents_generated.is_some() {
            self.documents_generated = other.documents_generated;
        }
    }
}

/// Ephemeral progress message emitted by pipeline components.
///
/// Never persisted as its own entity: consuming one means writing the job's
/// record with the new stage/message/counters.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job_id: String,
    pub stage: JobStage,
    pub message: String,
    pub counters: ProgressCounters,
}

/// The record persisted per job id in the status store.
///
/// Mutated only by the job's orchestrator as it advances through stages;
/// immutable once the stage is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub repo_url: String,
    pub stage: JobStage,
    pub message: String,
    #[serde(default)]
    pub counters: ProgressCounters,
    /// Per-file summaries, present only once the job completed.
    pub result: Option<Vec<SummaryDocument>>,
    /// Published artifact URL, present only once the job completed.
    pub result_url: Option<String>,
    /// Human-readable failure rendering, present only once the job failed.
    pub error: Option<String>,
}

impl JobRecord {
    /// A fresh record at submission time.
    pub fn queued(job_id: &str, repo_url: &str) -> Self {
        JobRecord {
            job_id: job_id.to_string(),
            repo_url: repo_url.to_string(),
            stage: JobStage::Queued,
            message: "Job has been queued for processing".to_string(),
            counters: ProgressCounters::default(),
            result: None,
            result_url: None,
            error: None,
        }
    }

    /// Move the record to `stage`, refusing to leave a terminal stage.
    ///
    /// Returns whether the transition was applied. A refused transition leaves
    /// the record untouched, which is what guarantees at most one terminal
    /// outcome per job.
    pub fn advance(&mut self, stage: JobStage, message: &str) -> bool {
        if self.stage.is_terminal() {
            warn!(
                job_id = %self.job_id,
                from = %self.stage,
                to = %stage,
                "Refusing stage transition out of terminal state"
            );
            return false;
        }
        self.stage = stage;
        self.message = message.to_string();
        true
    }
}

/// JSON-serializable return value of one task invocation, handed back to the
/// broker collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOutcome {
    pub status: JobStage,
    pub job_id: String,
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
