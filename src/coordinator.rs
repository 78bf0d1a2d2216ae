//! Parallel Summarization Coordinator: fans a file list out to bounded
//! concurrent summarizations, collects results as they complete, and reports
//! incremental progress.
//!
//! Output order is completion order, which can differ from the prioritized
//! submission order; the priority sort governs processing order, which is
//! what progressive pollers observe.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info};

use crate::job::{JobStage, ProgressCounters, ProgressEvent};
use crate::progress::ProgressReporter;
use crate::summarize::{FileSummarizer, SummaryDocument};

/// Summarize every file in `files` with at most `concurrency` in-flight
/// model calls, emitting a progress event after every `progress_every`
/// completions.
///
/// Per-file failures have already been absorbed into fallback documents by
/// the summarizer; a worker that still dies (panic or cancellation) is logged
/// and skipped without aborting sibling work. Files yielding no document
/// (unreadable or empty) are dropped from the output.
pub async fn summarize_all(
    summarizer: Arc<FileSummarizer>,
    root: &Path,
    files: &[String],
    concurrency: usize,
    progress_every: usize,
    progress: &ProgressReporter,
) -> Vec<SummaryDocument> {
    let total = files.len();
    if total == 0 {
        info!("No files to summarize, returning empty result set");
        return Vec::new();
    }

    info!(
        files = total,
        concurrency = concurrency,
        "Starting parallel summarization"
    );

    let mut documents = Vec::new();
    let mut completed: usize = 0;

    let mut results = stream::iter(files.iter().cloned().map(|rel_path| {
        let summarizer = summarizer.clone();
        let root = root.to_path_buf();
        tokio::spawn(async move {
            let doc = summarizer.summarize_file(&root, &rel_path).await;
            (rel_path, doc)
        })
    }))
    .buffer_unordered(concurrency.max(1));

    while let Some(joined) = results.next().await {
        completed += 1;
        match joined {
            Ok((rel_path, Some(doc))) => {
                debug!(file = %rel_path, "Summarization completed");
                documents.push(doc);
            }
            Ok((rel_path, None)) => {
                debug!(file = %rel_path, "File yielded no document");
            }
            Err(join_err) => {
                // A dead worker never takes its siblings or the job with it.
                error!(error = %join_err, "Summarization worker died, skipping file");
            }
        }

        if progress_every > 0 && completed % progress_every == 0 {
            let event = ProgressEvent {
                job_id: progress.job_id().await,
                stage: JobStage::Analyzing,
                message: format!("Processed {completed}/{total} files..."),
                counters: ProgressCounters {
                    files_processed: Some(completed as u64),
                    ..Default::default()
                },
            };
            progress.consume(event).await;
        }
    }

    info!(
        documents = documents.len(),
        files = total,
        "Completed parallel summarization"
    );
    documents
}
