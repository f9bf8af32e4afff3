//! Workflow Integration Tests
//!
//! ArchiveWorkflow の統合テスト（実際のZIP/CSVファイルを使用）

mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use socpack::adapter::config::Config;
use socpack::adapter::repositories::CsvExportRepository;
use socpack::application::dto::file_report::FileOutcome;
use socpack::driver::workflow::{ArchiveWorkflow, RunOptions, UploadStatus};
use socpack::domain::repositories::sheet_repository::SheetRepositoryFactory;

fn create_test_config(dir: &std::path::Path) -> Config {
    Config {
        work_dir: dir.join("work"),
        output_dir: dir.join("out"),
        ..Config::default()
    }
}

fn create_workflow(config: &Config, factory: Arc<dyn SheetRepositoryFactory>) -> ArchiveWorkflow {
    let exporter = Arc::new(CsvExportRepository::new(config.output_dir.clone()));
    ArchiveWorkflow::with_repositories(config, exporter, factory)
}

#[tokio::test]
async fn test_workflow_process_and_export() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::sample_bundle(&zip);
    let config = create_test_config(temp_dir.path());
    let workflow = create_workflow(&config, Arc::new(common::RecordingFactory::new()));

    let mut progress = Vec::new();
    let options = RunOptions {
        export: true,
        upload: false,
    };
    let report = workflow
        .run(&zip, options, |p| progress.push(p.to_string()))
        .await
        .unwrap();

    // Progress is reported for every CSV, including the malformed one
    assert_eq!(
        progress,
        vec![
            "Processing a.csv (1/3)... 33% done",
            "Processing b.csv (2/3)... 66% done",
            "Processing c.csv (3/3)... 100% done",
        ]
    );

    assert!(report
        .folder
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Upload_"));
    assert_eq!(report.files.len(), 3);
    assert_eq!(report.files[0].outcome, FileOutcome::Cleaned { rows: 2 });
    assert_eq!(report.files[1].outcome, FileOutcome::Cleaned { rows: 2 });
    assert!(report.files[2].is_skipped());
    assert_eq!(report.tables_merged, 2);
    assert_eq!(report.notice(), None);
    assert_eq!(report.upload, UploadStatus::NotRequested);

    let merged = report.merged.as_ref().unwrap();
    assert_eq!(
        merged.letters,
        vec!["A", "B", "J", "N", "V", "W", "X", "AA", "AB", "AC", "AD"]
    );
    let x = merged.letters.iter().position(|l| l == "X").unwrap();
    let sorted: Vec<&str> = merged.rows.iter().map(|r| r[x].as_str()).collect();
    assert_eq!(sorted, vec!["2", "5", "10", ""]);
    assert_eq!(merged.rows[0][0], "a0");
    assert_eq!(merged.rows[1][0], "b0");

    let export_path = report.export_path.as_ref().unwrap();
    assert!(export_path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("cleaned_data_"));
    let exported = fs::read_to_string(export_path).unwrap();
    let mut lines = exported.lines();
    assert_eq!(lines.next().unwrap(), "A,B,J,N,V,W,X,AA,AB,AC,AD");
    assert_eq!(lines.count(), 4);
}

#[tokio::test]
async fn test_workflow_publishes_original_headers() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::sample_bundle(&zip);
    let config = create_test_config(temp_dir.path());
    let factory = Arc::new(common::RecordingFactory::new());
    let workflow = create_workflow(&config, factory.clone());

    let options = RunOptions {
        export: false,
        upload: true,
    };
    let report = workflow.run(&zip, options, |_| {}).await.unwrap();

    match &report.upload {
        UploadStatus::Published(update) => assert_eq!(update.updated_rows, 5),
        other => panic!("expected upload, got {:?}", other),
    }
    assert!(report.export_path.is_none());
    assert_eq!(*factory.sheet.clears.lock().unwrap(), 1);

    let values = factory.sheet.values.lock().unwrap();
    assert_eq!(
        values[0],
        vec!["h0", "h1", "h9", "h13", "h21", "h22", "h23", "h26", "h27", "h28", "h29"]
    );
    assert_eq!(values.len(), 5);
}

#[tokio::test]
async fn test_workflow_upload_failure_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::sample_bundle(&zip);
    let config = create_test_config(temp_dir.path());
    let workflow = create_workflow(&config, Arc::new(common::FailingFactory));

    let options = RunOptions {
        export: false,
        upload: true,
    };
    let report = workflow.run(&zip, options, |_| {}).await.unwrap();

    match &report.upload {
        UploadStatus::Failed(error) => assert!(error.contains("no service account credentials")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(report.merged.is_some());
}

#[tokio::test]
async fn test_workflow_no_csv_files() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::write_zip(&zip, &[("notes.txt", "hello".to_string())]);
    let config = create_test_config(temp_dir.path());
    let factory = Arc::new(common::RecordingFactory::new());
    let workflow = create_workflow(&config, factory.clone());

    let options = RunOptions {
        export: true,
        upload: true,
    };
    let report = workflow.run(&zip, options, |_| {}).await.unwrap();

    assert_eq!(report.notice(), Some("No CSV files found in the ZIP"));
    assert!(report.export_path.is_none());
    assert_eq!(report.upload, UploadStatus::NotRequested);
    assert_eq!(*factory.sheet.clears.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_workflow_no_matching_rows() {
    let temp_dir = TempDir::new().unwrap();
    let zip = temp_dir.path().join("bundle.zip");
    common::write_zip(
        &zip,
        &[(
            "a.csv",
            common::csv(&[common::row("Depot", "SOC 5", "1", "a")]),
        )],
    );
    let config = create_test_config(temp_dir.path());
    let workflow = create_workflow(&config, Arc::new(common::RecordingFactory::new()));

    let report = workflow
        .run(&zip, RunOptions::default(), |_| {})
        .await
        .unwrap();

    assert_eq!(report.files[0].outcome, FileOutcome::Empty);
    assert_eq!(report.notice(), Some("No data was processed successfully"));
}

#[tokio::test]
async fn test_workflow_consecutive_runs_do_not_share_files() {
    let temp_dir = TempDir::new().unwrap();
    let one = temp_dir.path().join("one.zip");
    let two = temp_dir.path().join("two.zip");
    common::write_zip(
        &one,
        &[(
            "first.csv",
            common::csv(&[common::row("Station", "SOC 5", "1", "f")]),
        )],
    );
    common::write_zip(
        &two,
        &[(
            "second.csv",
            common::csv(&[common::row("Station", "SOC 5", "2", "s")]),
        )],
    );
    let config = create_test_config(temp_dir.path());
    let workflow = create_workflow(&config, Arc::new(common::RecordingFactory::new()));

    let first = workflow
        .run(&one, RunOptions::default(), |_| {})
        .await
        .unwrap();
    let second = workflow
        .run(&two, RunOptions::default(), |_| {})
        .await
        .unwrap();

    assert_ne!(first.folder, second.folder);
    let names: Vec<&str> = second.files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["second.csv"]);
    let merged = second.merged.as_ref().unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.rows[0][0], "s0");
}

#[tokio::test]
async fn test_workflow_rejects_missing_zip() {
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(temp_dir.path());
    let workflow = create_workflow(&config, Arc::new(common::RecordingFactory::new()));

    let result = workflow
        .run(
            &PathBuf::from("/nonexistent/bundle.zip"),
            RunOptions::default(),
            |_| {},
        )
        .await;

    assert!(result.unwrap_err().to_string().contains("File not found"));
}
