use std::fs::{create_dir_all, File};
use std::io::Write;
use std::sync::Arc;

use tempfile::tempdir;

use repodoc::contract::MockChatModel;
use repodoc::summarize::FileSummarizer;

fn write_file(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    write!(f, "{content}").unwrap();
}

#[tokio::test]
async fn valid_json_response_yields_structured_document() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path(), "app.py", "print(\"hi\")");

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_| Ok(r#"{"summary": "Prints hi.", "dependencies": []}"#.to_string()));

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    let doc = summarizer
        .summarize_file(tmp.path(), "app.py")
        .await
        .expect("Readable file should yield a document");

    assert_eq!(doc.file, "app.py");
    assert_eq!(doc.summary, "Prints hi.");
    assert!(doc.dependencies.is_empty());
}

#[tokio::test]
async fn non_json_response_is_kept_verbatim_as_summary() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path(), "app.py", "print(\"hi\")");

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_| Ok("A plain prose answer.".to_string()));

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    let doc = summarizer.summarize_file(tmp.path(), "app.py").await.unwrap();

    assert_eq!(doc.summary, "A plain prose answer.");
    assert!(doc.dependencies.is_empty());
}

#[tokio::test]
async fn model_transport_failure_still_produces_a_document() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path(), "app.py", "print(\"hi\")");

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_| Err("connection reset".into()));

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    let doc = summarizer
        .summarize_file(tmp.path(), "app.py")
        .await
        .expect("A single file's model failure never drops the file");

    assert!(doc.summary.contains("Error processing file"));
    assert!(doc.summary.contains("connection reset"));
    assert!(doc.dependencies.is_empty());
}

#[tokio::test]
async fn empty_file_is_silently_excluded() {
    let tmp = tempdir().unwrap();
    write_file(tmp.path(), "empty.py", "  \n\t\n");

    let mut model = MockChatModel::new();
    model.expect_complete().times(0);

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    assert!(
        summarizer.summarize_file(tmp.path(), "empty.py").await.is_none(),
        "Empty-after-strip content yields nothing, not an error entry"
    );
}

#[tokio::test]
async fn unreadable_file_is_silently_excluded() {
    let tmp = tempdir().unwrap();

    let mut model = MockChatModel::new();
    model.expect_complete().times(0);

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    assert!(summarizer
        .summarize_file(tmp.path(), "does-not-exist.py")
        .await
        .is_none());
}

#[tokio::test]
async fn oversized_content_is_truncated_in_the_prompt() {
    let tmp = tempdir().unwrap();
    let big = "x".repeat(500);
    write_file(tmp.path(), "big.py", &big);

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .withf(|prompt: &str| {
            prompt.contains("... (truncated for brevity)")
                && prompt.contains("File content was truncated")
        })
        .returning(|_| Ok(r#"{"summary": "Big.", "dependencies": []}"#.to_string()));

    let summarizer = FileSummarizer::new(Arc::new(model), 100);
    let doc = summarizer.summarize_file(tmp.path(), "big.py").await.unwrap();
    assert_eq!(doc.summary, "Big.");
}

#[tokio::test]
async fn import_hints_are_offered_to_the_model() {
    let tmp = tempdir().unwrap();
    write_file(
        tmp.path(),
        "pkg/module.py",
        "from .config import settings\nprint(settings)\n",
    );

    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .withf(|prompt: &str| prompt.contains("pkg/config.py"))
        .returning(|_| Ok(r#"{"summary": "Uses config.", "dependencies": ["pkg/config.py"]}"#.to_string()));

    let summarizer = FileSummarizer::new(Arc::new(model), 10_000);
    let doc = summarizer
        .summarize_file(tmp.path(), "pkg/module.py")
        .await
        .unwrap();
    assert_eq!(doc.dependencies, vec!["pkg/config.py".to_string()]);
}
