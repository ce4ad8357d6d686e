//! End-to-end batch workflows over local files
//!
//! These run the real processor with scripted removers so they need neither
//! the network nor an installed segmentation tool.

mod common;

use bgremove_batch::{
    process_directory, BatchConfig, BatchProcessor, ColorKeyRemover, ErrorKind, ImageSource,
    ItemStatus, NamingScheme, ProcessingStage, ProgressEvent, RecordingProgressReporter,
    ScanConfig,
};
use common::{load_rgba, write_product_jpeg, CountingFetcher, ScriptedRemover};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn config(output: &std::path::Path, commit: bool, skip_existing: bool) -> BatchConfig {
    BatchConfig::builder()
        .output_dir(output)
        .commit(commit)
        .skip_existing(skip_existing)
        .naming(NamingScheme::UnderscoreNoBg)
        .build()
        .expect("valid config")
}

fn write_inputs(dir: &std::path::Path, names: &[&str]) -> Vec<ImageSource> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            write_product_jpeg(&path);
            ImageSource::path(path)
        })
        .collect()
}

#[tokio::test]
async fn test_every_source_visited_once_in_order() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let mut sources = write_inputs(input.path(), &["c.jpg", "a.jpg", "b.jpg"]);
    sources.insert(1, ImageSource::path(input.path().join("missing.jpg")));

    let calls = Arc::new(AtomicUsize::new(0));
    let recorder = Arc::new(RecordingProgressReporter::new());
    let processor = BatchProcessor::new(
        config(output.path(), true, false),
        Box::new(ScriptedRemover::new(calls.clone())),
    )
    .unwrap()
    .with_reporter(Box::new(recorder.clone()));

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.summary.total, 4);
    assert_eq!(report.summary.succeeded, 3);
    assert_eq!(report.summary.failed, 1);
    assert!(report.summary.is_complete());
    assert_eq!(recorder.item_order(), sources);
    assert_eq!(report.items[1].error_kind, Some(ErrorKind::FileAccess));
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    let events = recorder.events();
    assert!(matches!(
        events.first(),
        Some(ProgressEvent::Start {
            total: 4,
            dry_run: false
        })
    ));
    assert!(matches!(events.last(), Some(ProgressEvent::Summary(_))));
    assert_eq!(
        &recorder.stages()[..4],
        &[
            ProcessingStage::Acquiring,
            ProcessingStage::Normalizing,
            ProcessingStage::RemovingBackground,
            ProcessingStage::Saving,
        ]
    );
}

#[tokio::test]
async fn test_transform_failure_does_not_stop_batch() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let sources = write_inputs(input.path(), &["one.jpg", "two.jpg", "three.jpg"]);

    let calls = Arc::new(AtomicUsize::new(0));
    let processor = BatchProcessor::new(
        config(output.path(), true, false),
        Box::new(ScriptedRemover::new(calls.clone()).failing_on(&[2])),
    )
    .unwrap();

    let report = processor.run_with_report(&sources).await;

    let statuses: Vec<_> = report.items.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![ItemStatus::Succeeded, ItemStatus::Failed, ItemStatus::Succeeded]
    );
    assert_eq!(report.items[1].error_kind, Some(ErrorKind::Transform));
    assert!(output.path().join("one_nobg.png").exists());
    assert!(!output.path().join("two_nobg.png").exists());
    assert!(output.path().join("three_nobg.png").exists());

    let written = load_rgba(&output.path().join("three_nobg.png"));
    assert_eq!(written.get_pixel(0, 0)[3], 128);
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let sources = write_inputs(input.path(), &["a.jpg", "b.jpg"]);

    let calls = Arc::new(AtomicUsize::new(0));
    let processor = BatchProcessor::new(
        config(output.path(), true, true),
        Box::new(ScriptedRemover::new(calls.clone())),
    )
    .unwrap();

    let first = processor.run(&sources).await;
    assert_eq!(first.succeeded, 2);
    let first_bytes = std::fs::read(output.path().join("a_nobg.png")).unwrap();

    let second = processor.run(&sources).await;
    assert_eq!(second.skipped, 2);
    assert_eq!(second.failed, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        std::fs::read(output.path().join("a_nobg.png")).unwrap(),
        first_bytes
    );
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let out_dir = output.path().join("nobg");
    let sources = write_inputs(input.path(), &["a.jpg", "b.jpg"]);

    let fetches = Arc::new(AtomicUsize::new(0));
    let removals = Arc::new(AtomicUsize::new(0));
    let processor = BatchProcessor::new(
        config(&out_dir, false, false),
        Box::new(ScriptedRemover::new(removals.clone())),
    )
    .unwrap()
    .with_fetcher(Box::new(CountingFetcher::new(fetches.clone())));

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.summary.dry_run, 2);
    assert_eq!(report.summary.succeeded, 0);
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(removals.load(Ordering::SeqCst), 0);
    assert!(!out_dir.exists());
    assert_eq!(report.items[0].output, out_dir.join("a_nobg.png"));
}

#[tokio::test]
async fn test_shared_stem_last_writer_wins() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    std::fs::create_dir(input.path().join("left")).unwrap();
    std::fs::create_dir(input.path().join("right")).unwrap();
    let sources = write_inputs(input.path(), &["left/shoe.jpg", "right/shoe.jpg"]);

    let calls = Arc::new(AtomicUsize::new(0));
    let recorder = Arc::new(RecordingProgressReporter::new());
    let processor = BatchProcessor::new(
        config(output.path(), true, false),
        Box::new(ScriptedRemover::new(calls.clone())),
    )
    .unwrap()
    .with_reporter(Box::new(recorder.clone()));

    let report = processor.run_with_report(&sources).await;

    assert_eq!(report.summary.succeeded, 2);
    assert_eq!(report.items[0].output, report.items[1].output);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let warnings = recorder.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("right"));
    assert!(warnings[0].contains("shoe_nobg.png"));
}

#[tokio::test]
async fn test_directory_scan_with_color_key() {
    let input = TempDir::new().unwrap();
    write_inputs(input.path(), &["boot.jpg", "boot_alt.jpg", "sandal.jpg"]);
    std::fs::write(input.path().join("notes.txt"), "not an image").unwrap();
    let out_dir = input.path().join("nobg");

    let processor = BatchProcessor::new(
        config(&out_dir, true, true),
        Box::new(ColorKeyRemover::new(40)),
    )
    .unwrap();
    let scan = ScanConfig {
        input_dir: input.path().to_path_buf(),
        ..ScanConfig::default()
    };

    let report = process_directory(&processor, &scan).await.unwrap();

    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.succeeded, 2);
    assert!(out_dir.join("boot_nobg.png").exists());
    assert!(out_dir.join("sandal_nobg.png").exists());
    assert!(!out_dir.join("boot_alt_nobg.png").exists());

    let cutout = load_rgba(&out_dir.join("boot_nobg.png"));
    assert_eq!(cutout.get_pixel(0, 0)[3], 0);
    assert_eq!(cutout.get_pixel(8, 8)[3], 255);

    let rerun = process_directory(&processor, &scan).await.unwrap();
    assert_eq!(rerun.summary.skipped, 2);
}

#[tokio::test]
async fn test_missing_input_directory_is_an_error() {
    let output = TempDir::new().unwrap();
    let processor = BatchProcessor::new(
        config(output.path(), true, true),
        Box::new(ColorKeyRemover::default()),
    )
    .unwrap();
    let scan = ScanConfig {
        input_dir: output.path().join("does-not-exist"),
        ..ScanConfig::default()
    };

    let error = process_directory(&processor, &scan).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::FileAccess);
}
