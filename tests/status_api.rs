use repodoc::contract::StatusStore;
use repodoc::job::{JobRecord, JobStage, ProgressCounters};
use repodoc::status::{fetch_status, submit_job, InMemoryStatusStore};

#[tokio::test]
async fn unknown_job_id_answers_as_queued_never_an_error() {
    let store = InMemoryStatusStore::new();
    let response = fetch_status(&store, "never-submitted")
        .await
        .expect("Status query must not fail for unknown ids");
    assert_eq!(response.status, "queued");
    assert_eq!(response.job_id, "never-submitted");
    assert!(response.error.is_none());
}

#[tokio::test]
async fn submission_registers_an_initial_queued_record() {
    let store = InMemoryStatusStore::new();
    let receipt = submit_job(&store, "https://github.com/acme/tiny")
        .await
        .expect("Submission should succeed");
    assert_eq!(receipt.status, "queued");

    let response = fetch_status(&store, &receipt.job_id).await.unwrap();
    assert_eq!(response.status, "queued");
}

#[tokio::test]
async fn in_flight_jobs_report_processing_with_stage_and_counters() {
    let store = InMemoryStatusStore::new();
    let mut record = JobRecord::queued("job-x", "https://github.com/acme/tiny");
    record.advance(JobStage::Analyzing, "Processing 5/12 files...");
    record.counters.merge(ProgressCounters {
        files_found: Some(12),
        files_processed: Some(5),
        documents_generated: None,
    });
    store.put_record("job-x", &record).await.unwrap();

    let response = fetch_status(&store, "job-x").await.unwrap();
    assert_eq!(response.status, "processing");
    assert_eq!(response.stage.as_deref(), Some("analyzing"));
    assert_eq!(response.files_processed, Some(5));
    assert!(response.result.is_none(), "No result before a terminal state");
}

#[tokio::test]
async fn completed_jobs_expose_result_and_url() {
    let store = InMemoryStatusStore::new();
    let mut record = JobRecord::queued("job-done", "https://github.com/acme/tiny");
    record.advance(JobStage::Completed, "Documentation generated");
    record.counters.merge(ProgressCounters {
        files_found: Some(1),
        files_processed: Some(1),
        documents_generated: Some(1),
    });
    record.result = Some(vec![repodoc::summarize::SummaryDocument {
        file: "app.py".to_string(),
        summary: "Prints hi.".to_string(),
        dependencies: vec![],
    }]);
    record.result_url = Some("https://cdn.example.com/job-done/index.html".to_string());
    store.put_record("job-done", &record).await.unwrap();

    let response = fetch_status(&store, "job-done").await.unwrap();
    assert_eq!(response.status, "completed");
    assert_eq!(response.documents_generated, Some(1));
    assert_eq!(response.result.as_ref().map(|r| r.len()), Some(1));
    assert_eq!(
        response.result_url.as_deref(),
        Some("https://cdn.example.com/job-done/index.html")
    );
}

#[tokio::test]
async fn failed_jobs_expose_a_non_empty_error() {
    let store = InMemoryStatusStore::new();
    let mut record = JobRecord::queued("job-bad", "not-a-url");
    record.advance(JobStage::Failed, "Failed to clone repository");
    record.error = Some("failed to clone repository: git exited with 128".to_string());
    store.put_record("job-bad", &record).await.unwrap();

    let response = fetch_status(&store, "job-bad").await.unwrap();
    assert_eq!(response.status, "failed");
    assert!(!response.error.unwrap().is_empty());
    assert!(response.result.is_none());
}
