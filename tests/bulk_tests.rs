use std::fs;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::mpsc;

use tempfile::TempDir;

use photo_fields::core::bulk::BulkEditor;
use photo_fields::core::formats::collect_images;
use photo_fields::models::{FieldEdit, OperationSummary, SemanticField, TagValue};
use photo_fields::{MetadataRecord, StoreConfig};

fn config() -> StoreConfig {
    StoreConfig {
        embed_exif: false,
        embed_xmp: false,
        ..StoreConfig::default()
    }
}

fn create_inputs(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.path().join(name);
            fs::write(&path, b"sample-bytes").expect("should create input file");
            path
        })
        .collect()
}

#[test]
fn apply_sets_field_on_every_file_and_reports_progress() {
    let dir = TempDir::new().expect("should create temp dir");
    let inputs = create_inputs(&dir, &["a.jpg", "b.png", "c.webp"]);
    let edits = [FieldEdit::set(SemanticField::Creator, TagValue::single("Ann"))];

    let (tx, rx) = mpsc::channel();
    let results = BulkEditor::apply(&inputs, &edits, &config(), tx);

    assert_eq!(results.len(), 3);
    for (result, input) in results.iter().zip(&inputs) {
        assert_eq!(&result.path, input, "results should keep input order");
        assert!(result.success);
        assert!(result.changed);
    }

    let mut events = rx.iter().collect::<Vec<_>>();
    assert_eq!(events.len(), 3);
    events.sort_by_key(|event| event.current);
    assert_eq!(
        events.iter().map(|event| event.current).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert!(events.iter().all(|event| event.total == 3 && event.success));

    for input in &inputs {
        let record =
            MetadataRecord::open_with_config(input, config()).expect("edited file should open");
        assert_eq!(
            record
                .get_field(SemanticField::Creator)
                .expect("creator should decode"),
            Some(TagValue::single("Ann"))
        );
    }
}

#[test]
fn second_identical_run_changes_nothing() {
    let dir = TempDir::new().expect("should create temp dir");
    let inputs = create_inputs(&dir, &["repeat.jpg"]);
    let edits = [FieldEdit::set(
        SemanticField::Keywords,
        TagValue::TextList(vec![String::from("alps")]),
    )];

    let (tx, _rx) = mpsc::channel();
    BulkEditor::apply(&inputs, &edits, &config(), tx);
    let (tx, _rx) = mpsc::channel();
    let results = BulkEditor::apply(&inputs, &edits, &config(), tx);

    assert!(results[0].success);
    assert!(!results[0].changed);
}

#[test]
fn delete_edit_removes_field() {
    let dir = TempDir::new().expect("should create temp dir");
    let inputs = create_inputs(&dir, &["gps.jpg"]);

    let latitude = SemanticField::Latitude
        .parse_value("48.8584")
        .expect("latitude should parse");

    let (tx, _rx) = mpsc::channel();
    BulkEditor::apply(
        &inputs,
        &[FieldEdit::set(SemanticField::Latitude, latitude)],
        &config(),
        tx,
    );

    let (tx, _rx) = mpsc::channel();
    let results = BulkEditor::apply(
        &inputs,
        &[FieldEdit::delete(SemanticField::Latitude)],
        &config(),
        tx,
    );
    assert!(results[0].changed);

    let record =
        MetadataRecord::open_with_config(&inputs[0], config()).expect("edited file should open");
    assert!(!record.has_geotag());
}

#[test]
fn failures_are_reported_per_file() {
    let dir = TempDir::new().expect("should create temp dir");
    let mut inputs = create_inputs(&dir, &["ok.jpg"]);
    inputs.push(dir.path().join("missing.jpg"));
    let edits = [FieldEdit::set(SemanticField::Title, TagValue::single("Title"))];

    let (tx, rx) = mpsc::channel();
    let results = BulkEditor::apply(&inputs, &edits, &config(), tx);

    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(results[1]
        .error
        .as_deref()
        .is_some_and(|message| message.contains("file not found")));
    assert_eq!(rx.iter().filter(|event| !event.success).count(), 1);

    let summary = OperationSummary::from_results(inputs.len(), &results);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.cancelled, 0);
}

#[test]
fn invalid_value_fails_without_writing() {
    let dir = TempDir::new().expect("should create temp dir");
    let inputs = create_inputs(&dir, &["date.jpg"]);
    let edits = [FieldEdit::set(SemanticField::Date, TagValue::single("last summer"))];

    let (tx, _rx) = mpsc::channel();
    let results = BulkEditor::apply(&inputs, &edits, &config(), tx);

    assert!(!results[0].success);
    assert!(!dir.path().join("date.jpg.fields.json").exists());
}

#[test]
fn cancelled_run_processes_nothing() {
    let dir = TempDir::new().expect("should create temp dir");
    let inputs = create_inputs(&dir, &["one.jpg", "two.jpg"]);
    let cancel = AtomicBool::new(true);
    let edits = [FieldEdit::set(SemanticField::Title, TagValue::single("Never"))];

    let (tx, rx) = mpsc::channel();
    let results = BulkEditor::apply_with_cancel(&inputs, &edits, &config(), tx, Some(&cancel));

    assert!(results.is_empty());
    assert_eq!(rx.iter().count(), 0);

    let summary = OperationSummary::from_results(inputs.len(), &results);
    assert_eq!(summary.cancelled, 2);
}

#[test]
fn collect_images_walks_directories() {
    let dir = TempDir::new().expect("should create temp dir");
    let sub = dir.path().join("sub");
    fs::create_dir(&sub).expect("should create subdirectory");
    fs::write(dir.path().join("a.jpg"), b"fake").expect("should write image");
    fs::write(sub.join("b.HEIC"), b"fake").expect("should write image");
    fs::write(sub.join("notes.txt"), b"fake").expect("should write text");

    let images = collect_images(&[dir.path().to_path_buf()]);

    assert_eq!(images.len(), 2);
    assert!(collect_images(&[sub.join("notes.txt")]).is_empty());
    assert!(collect_images(&[dir.path().join("nowhere")]).is_empty());
}
