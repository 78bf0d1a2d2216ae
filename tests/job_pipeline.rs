use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use tempfile::tempdir;

use repodoc::config::PipelineConfig;
use repodoc::contract::{MockChatModel, MockObjectStore, PutObjectRequest};
use repodoc::job::JobStage;
use repodoc::orchestrate::JobRunner;
use repodoc::status::{fetch_status, InMemoryStatusStore};

/// Build a one-file git repository to clone from.
fn fixture_repo(dir: &Path) {
    let mut f = File::create(dir.join("app.py")).unwrap();
    writeln!(f, "print(\"hi\")").unwrap();

    let run = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("git must be available for pipeline tests");
        assert!(status.success(), "git {args:?} failed");
    };
    run(&["init", "-q"]);
    run(&["add", "."]);
    run(&[
        "-c",
        "user.name=Test",
        "-c",
        "user.email=test@example.com",
        "commit",
        "-q",
        "-m",
        "init",
    ]);
}

fn pipeline_config(scratch: &Path) -> PipelineConfig {
    PipelineConfig {
        scratch_dir: scratch.to_path_buf(),
        concurrency: 4,
        max_file_chars: 10_000,
        progress_every: 5,
    }
}

#[tokio::test]
async fn happy_path_runs_to_completed_and_cleans_up() {
    let repo = tempdir().unwrap();
    fixture_repo(repo.path());
    let scratch = tempdir().unwrap();

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_| Ok(r#"{"summary": "Prints hi.", "dependencies": []}"#.to_string()));

    let mut object_store = MockObjectStore::new();
    object_store.expect_put_object().returning(|_req: PutObjectRequest<'_>| Ok(()));
    object_store
        .expect_object_url()
        .returning(|key, _| Ok(format!("https://cdn.example.com/{key}")));

    let status_store = Arc::new(InMemoryStatusStore::new());
    let runner = JobRunner::new(
        Arc::new(model),
        Arc::new(object_store),
        status_store.clone(),
        pipeline_config(scratch.path()),
    );

    let repo_url = repo.path().to_string_lossy().into_owned();
    let outcome = runner.run_job("job-e2e", &repo_url).await;

    assert_eq!(outcome.status, JobStage::Completed);
    assert_eq!(outcome.files_processed, Some(1));
    assert_eq!(outcome.documents_generated, Some(1));
    assert_eq!(
        outcome.result_url.as_deref(),
        Some("https://cdn.example.com/job-e2e/index.html")
    );
    let result = outcome.result.expect("Completed job carries its documents");
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].file, "app.py");
    assert_eq!(result[0].summary, "Prints hi.");

    // The status store saw the terminal state too.
    let polled = fetch_status(status_store.as_ref(), "job-e2e").await.unwrap();
    assert_eq!(polled.status, "completed");
    assert_eq!(polled.files_processed, Some(1));

    let leftovers: Vec<_> = fs::read_dir(scratch.path()).unwrap().collect();
    assert!(
        leftovers.is_empty(),
        "Scratch directory must be removed on the success path"
    );
}

#[tokio::test]
async fn clone_failure_lands_in_failed_with_no_scratch_leftovers() {
    let scratch = tempdir().unwrap();

    let mut model = MockChatModel::new();
    model.expect_complete().times(0);
    let mut object_store = MockObjectStore::new();
    object_store.expect_put_object().times(0);
    object_store.expect_object_url().times(0);

    let status_store = Arc::new(InMemoryStatusStore::new());
    let runner = JobRunner::new(
        Arc::new(model),
        Arc::new(object_store),
        status_store.clone(),
        pipeline_config(scratch.path()),
    );

    let outcome = runner
        .run_job("job-fail", "/definitely/not/a/repository")
        .await;

    assert_eq!(outcome.status, JobStage::Failed);
    let error = outcome.error.expect("Failed job carries an error string");
    assert!(!error.is_empty());

    let polled = fetch_status(status_store.as_ref(), "job-fail").await.unwrap();
    assert_eq!(polled.status, "failed");

    let leftovers: Vec<_> = fs::read_dir(scratch.path()).unwrap().collect();
    assert!(
        leftovers.is_empty(),
        "No scratch directory survives a failed clone"
    );
}

#[tokio::test]
async fn upload_failure_fails_the_job_but_still_cleans_up() {
    let repo = tempdir().unwrap();
    fixture_repo(repo.path());
    let scratch = tempdir().unwrap();

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_| Ok(r#"{"summary": "Prints hi.", "dependencies": []}"#.to_string()));

    let mut object_store = MockObjectStore::new();
    object_store
        .expect_put_object()
        .returning(|_req: PutObjectRequest<'_>| Err(repodoc::contract::StoreError::Other("bucket outage".into())));
    object_store.expect_object_url().times(0);

    let status_store = Arc::new(InMemoryStatusStore::new());
    let runner = JobRunner::new(
        Arc::new(model),
        Arc::new(object_store),
        status_store,
        pipeline_config(scratch.path()),
    );

    let repo_url = repo.path().to_string_lossy().into_owned();
    let outcome = runner.run_job("job-upload-fail", &repo_url).await;

    assert_eq!(outcome.status, JobStage::Failed);
    assert!(outcome.error.unwrap().contains("Failed to upload artifact"));

    let leftovers: Vec<_> = fs::read_dir(scratch.path()).unwrap().collect();
    assert!(
        leftovers.is_empty(),
        "Scratch directory must be removed on the failure path too"
    );
}

#[tokio::test]
async fn empty_repository_completes_with_placeholder_artifact() {
    let repo = tempdir().unwrap();
    // A repository whose only tracked file is excluded by the selector.
    let mut f = File::create(repo.path().join("logo.png")).unwrap();
    writeln!(f, "not a real png").unwrap();
    let run = |args: &[&str]| {
        let status = Command::new("git")
            .args(args)
            .current_dir(repo.path())
            .status()
            .unwrap();
        assert!(status.success());
    };
    run(&["init", "-q"]);
    run(&["add", "."]);
    run(&[
        "-c",
        "user.name=Test",
        "-c",
        "user.email=test@example.com",
        "commit",
        "-q",
        "-m",
        "init",
    ]);

    let scratch = tempdir().unwrap();

    let mut model = MockChatModel::new();
    model.expect_complete().times(0);

    let mut object_store = MockObjectStore::new();
    object_store
        .expect_put_object()
        .withf(|req| {
            let html = std::str::from_utf8(req.body).unwrap_or("");
            html.contains("No Documentation Generated")
        })
        .returning(|_req: PutObjectRequest<'_>| Ok(()));
    object_store
        .expect_object_url()
        .returning(|key, _| Ok(format!("https://cdn.example.com/{key}")));

    let runner = JobRunner::new(
        Arc::new(model),
        Arc::new(object_store),
        Arc::new(InMemoryStatusStore::new()),
        pipeline_config(scratch.path()),
    );

    let repo_url = repo.path().to_string_lossy().into_owned();
    let outcome = runner.run_job("job-empty", &repo_url).await;

    assert_eq!(outcome.status, JobStage::Completed);
    assert_eq!(outcome.files_processed, Some(0));
    assert_eq!(outcome.documents_generated, Some(0));
}
