//! Job Orchestrator: drives one job through the pipeline state machine
//! (cloning → analyzing → uploading → completed/failed), persisting every
//! transition and guaranteeing scratch cleanup on both exit paths.
//!
//! This is the task-invocation boundary: the broker hands over
//! `(job_id, repo_url)` and receives a JSON-serializable [`JobOutcome`].
//! Every escalation is caught here and rendered into the terminal `failed`
//! record — a failure never leaves this module as an unhandled fault.

use std::sync::Arc;

use tracing::{error, info};

use crate::compile;
use crate::config::PipelineConfig;
use crate::contract::{ChatModel, ObjectStore, StatusStore};
use crate::coordinator;
use crate::job::{JobOutcome, JobRecord, JobStage, ProgressCounters};
use crate::materialize::{materialize, Workspace};
use crate::progress::ProgressReporter;
use crate::publish;
use crate::select;
use crate::summarize::{FileSummarizer, SummaryDocument};

/// Everything one job needs: the opaque collaborators plus pipeline tunables.
pub struct JobRunner {
    model: Arc<dyn ChatModel>,
    object_store: Arc<dyn ObjectStore>,
    status_store: Arc<dyn StatusStore>,
    config: PipelineConfig,
}

impl JobRunner {
    pub fn new(
        model: Arc<dyn ChatModel>,
        object_store: Arc<dyn ObjectStore>,
        status_store: Arc<dyn StatusStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            model,
            object_store,
            status_store,
            config,
        }
    }

    /// Run one job to a terminal state.
    pub async fn run_job(&self, job_id: &str, repo_url: &str) -> JobOutcome {
        info!(job_id = job_id, repo_url = repo_url, "Starting job");

        let reporter = ProgressReporter::new(
            self.status_store.clone(),
            JobRecord::queued(job_id, repo_url),
        );

        reporter
            .update(
                JobStage::Cloning,
                "Cloning repository...",
                ProgressCounters::default(),
            )
            .await;

        let workspace = match materialize(repo_url, job_id, &self.config.scratch_dir) {
            Ok(workspace) => workspace,
            Err(e) => {
                // Materialize already removed its partial directory.
                error!(job_id = job_id, error = %e, "Clone stage failed");
                let record = reporter.fail(&e.to_string()).await;
                return outcome_from(record);
            }
        };

        let staged = self.run_stages(&workspace, job_id, repo_url, &reporter).await;

        // The scratch directory is removed exactly once, on the exit path of
        // the job, success or failure.
        workspace.cleanup();

        let record = match staged {
            Ok(staged) => {
                info!(
                    job_id = job_id,
                    files = staged.files_found,
                    documents = staged.documents.len(),
                    url = %staged.result_url,
                    "Job completed successfully"
                );
                reporter
                    .complete(
                        "Documentation generated",
                        ProgressCounters {
                            files_found: Some(staged.files_found as u64),
                            files_processed: Some(staged.files_found as u64),
                            documents_generated: Some(staged.documents.len() as u64),
                        },
                        staged.documents,
                        staged.result_url,
                    )
                    .await
            }
            Err(message) => {
                error!(job_id = job_id, error = %message, "Job failed");
                reporter.fail(&message).await
            }
        };

        outcome_from(record)
    }

    /// The stages that run with a live workspace. Any error escalates as a
    /// rendered message; the caller owns cleanup and the terminal record.
    async fn run_stages(
        &self,
        workspace: &Workspace,
        job_id: &str,
        repo_url: &str,
        reporter: &ProgressReporter,
    ) -> Result<StagedResult, String> {
        reporter
            .update(
                JobStage::Analyzing,
                "Indexing repository files...",
                ProgressCounters::default(),
            )
            .await;

        let files = select::select_files(workspace.root())
            .map_err(|e| format!("Failed to index repository files: {e}"))?;

        reporter
            .update(
                JobStage::Analyzing,
                &format!("Generating documentation for {} files...", files.len()),
                ProgressCounters {
                    files_found: Some(files.len() as u64),
                    ..Default::default()
                },
            )
            .await;

        let summarizer = Arc::new(FileSummarizer::new(
            self.model.clone(),
            self.config.max_file_chars,
        ));
        let documents = coordinator::summarize_all(
            summarizer,
            workspace.root(),
            &files,
            self.config.concurrency,
            self.config.progress_every,
            reporter,
        )
        .await;

        reporter
            .update(
                JobStage::Uploading,
                "Compiling documentation...",
                ProgressCounters {
                    files_processed: Some(files.len() as u64),
                    documents_generated: Some(documents.len() as u64),
                    ..Default::default()
                },
            )
            .await;

        let generated_at = chrono::Utc::now()
            .format("%B %d, %Y at %H:%M UTC")
            .to_string();
        let artifact = compile::compile(&documents, repo_url, &generated_at);

        reporter
            .update(
                JobStage::Uploading,
                "Uploading documentation to storage...",
                ProgressCounters::default(),
            )
            .await;

        let result_url = publish::publish(self.object_store.as_ref(), &artifact.html, job_id)
            .await
            .map_err(|e| format!("Failed to upload artifact: {e}"))?;

        Ok(StagedResult {
            files_found: files.len(),
            documents,
            result_url,
        })
    }
}

struct StagedResult {
    files_found: usize,
    documents: Vec<SummaryDocument>,
    result_url: String,
}

fn outcome_from(record: JobRecord) -> JobOutcome {
    JobOutcome {
        status: record.stage,
        job_id: record.job_id,
        files_processed: record.counters.files_processed,
        documents_generated: record.counters.documents_generated,
        result: record.result,
        result_url: record.result_url,
        error: record.error,
    }
}
