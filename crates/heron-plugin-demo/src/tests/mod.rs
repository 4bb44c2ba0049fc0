//! Unit tests for the demo prediction plugin.


use std::fs::{self, File};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use heron_plugin_api::FieldKind;
use heron_plugin_api::protocol::{PluginOutput, PluginResponse};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use crate::{Accept, NOTES_TEXT, PredictRequest, get_metadata, get_predict_args, predict, run};

const SAMPLE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\ndemo image bytes";

#[fixture]
fn upload_dir() -> TempDir {
    TempDir::new().expect("create upload dir")
}

fn write_upload(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write upload");
    path
}

fn read_entry(archive: &mut zip::ZipArchive<File>, name: &str) -> Vec<u8> {
    let mut entry = archive.by_name(name).expect("entry present");
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).expect("read entry");
    bytes
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[test]
fn metadata_reports_all_six_fields_non_empty() {
    let record = get_metadata();
    assert!(record.validate().is_ok());
    assert_eq!(record.fields().len(), 6);
    assert!(
        record
            .fields()
            .iter()
            .all(|(_, value)| !value.trim().is_empty())
    );
}

#[test]
fn metadata_is_deterministic() {
    assert_eq!(get_metadata(), get_metadata());
}

// ---------------------------------------------------------------------------
// Argument schema
// ---------------------------------------------------------------------------

#[test]
fn predict_args_declare_image_and_accept_fields() {
    let schema = get_predict_args();
    assert_eq!(schema.len(), 2);

    let image = schema.field("demo-image").expect("demo-image declared");
    assert_eq!(image.kind(), FieldKind::File);
    assert!(!image.is_required());
    assert!(image.choices().is_none());

    let accept = schema.field("accept").expect("accept declared");
    assert_eq!(accept.kind(), FieldKind::Text);
    let choices = accept.choices().expect("choices declared");
    assert_eq!(choices, ["image/*", "application/zip"]);
}

#[rstest]
#[case::image("image/*")]
#[case::zip("application/zip")]
fn accept_field_accepts_listed_media_types(#[case] value: &str) {
    assert!(get_predict_args().validate_value("accept", value).is_ok());
}

#[rstest]
#[case::plain_text("text/plain")]
#[case::empty("")]
#[case::near_miss("image")]
fn accept_field_rejects_values_outside_choices(#[case] value: &str) {
    assert!(get_predict_args().validate_value("accept", value).is_err());
}

#[rstest]
#[case::image("image/*", Accept::Image)]
#[case::zip("application/zip", Accept::Zip)]
fn accept_parses_supported_media_types(#[case] text: &str, #[case] expected: Accept) {
    assert_eq!(text.parse::<Accept>().expect("parse"), expected);
    assert_eq!(expected.as_str(), text);
}

#[test]
fn accept_rejects_unknown_media_type() {
    let error = "text/plain"
        .parse::<Accept>()
        .expect_err("parse should fail");
    assert!(
        error
            .to_string()
            .contains("unsupported accept value 'text/plain'"),
        "unexpected message: {error}"
    );
}

// ---------------------------------------------------------------------------
// Predict: identity transform
// ---------------------------------------------------------------------------

#[rstest]
fn predict_image_returns_input_bytes_unchanged(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response =
        predict(&PredictRequest::new(&input, Accept::Image)).expect("predict should succeed");
    assert_eq!(response.media_type(), "image/*");
    assert_eq!(response.path(), &input);

    let mut body = response.into_body();
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes).expect("read body");
    assert_eq!(bytes, SAMPLE_BYTES);
}

// ---------------------------------------------------------------------------
// Predict: archive packaging
// ---------------------------------------------------------------------------

#[rstest]
fn predict_zip_packs_image_and_notes(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response =
        predict(&PredictRequest::new(&input, Accept::Zip)).expect("predict should succeed");
    assert_eq!(response.media_type(), "application/zip");

    let mut archive = zip::ZipArchive::new(response.into_body()).expect("open archive");
    assert_eq!(archive.len(), 2);
    assert_eq!(read_entry(&mut archive, "demo.png"), SAMPLE_BYTES);
    assert_eq!(read_entry(&mut archive, "demo.txt"), NOTES_TEXT.as_bytes());
}

#[rstest]
fn predict_zip_releases_workspace_on_into_body(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response =
        predict(&PredictRequest::new(&input, Accept::Zip)).expect("predict should succeed");
    let archive_path = response.path().clone();
    assert!(archive_path.exists());

    let body = response.into_body();
    assert!(!archive_path.exists(), "workspace should be released");
    // The already-open handle must stay readable.
    let mut archive = zip::ZipArchive::new(body).expect("open archive");
    assert_eq!(read_entry(&mut archive, "demo.png"), SAMPLE_BYTES);
}

#[rstest]
fn predict_zip_keep_persists_artifact(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response =
        predict(&PredictRequest::new(&input, Accept::Zip)).expect("predict should succeed");
    let (_body, path) = response.keep();
    assert!(path.exists(), "kept artifact should remain on disk");

    let workspace = path.parent().expect("artifact parent").to_path_buf();
    fs::remove_dir_all(workspace).expect("clean up kept workspace");
}

// ---------------------------------------------------------------------------
// Predict: failure policy
// ---------------------------------------------------------------------------

#[rstest]
#[case::image(Accept::Image)]
#[case::zip(Accept::Zip)]
fn predict_missing_input_is_rejected_with_cause(#[case] accept: Accept, upload_dir: TempDir) {
    let missing = upload_dir.path().join("nope.png");

    let error =
        predict(&PredictRequest::new(&missing, accept)).expect_err("predict should fail");
    assert!(error.to_string().starts_with("bad request:"));

    let reason = error.reason();
    assert!(
        reason.contains("nope.png"),
        "expected path in reason: {reason}"
    );
    assert!(
        reason.contains("No such file") || reason.contains("not found"),
        "expected file-not-found cause in reason: {reason}"
    );
}

// ---------------------------------------------------------------------------
// Predict: workspace isolation
// ---------------------------------------------------------------------------

#[test]
fn concurrent_predictions_stay_independent() {
    let dir = TempDir::new().expect("create upload dir");
    let first = write_upload(&dir, "first.png", b"first payload");
    let second = write_upload(&dir, "second.png", b"second payload");

    let (left, right) = std::thread::scope(|scope| {
        let left = scope.spawn(|| predict(&PredictRequest::new(&first, Accept::Zip)));
        let right = scope.spawn(|| predict(&PredictRequest::new(&second, Accept::Zip)));
        (
            left.join().expect("join left"),
            right.join().expect("join right"),
        )
    });

    let left_response = left.expect("left predict");
    let right_response = right.expect("right predict");
    assert_ne!(left_response.path(), right_response.path());

    let mut left_archive =
        zip::ZipArchive::new(left_response.into_body()).expect("open left archive");
    let mut right_archive =
        zip::ZipArchive::new(right_response.into_body()).expect("open right archive");
    assert_eq!(read_entry(&mut left_archive, "demo.png"), b"first payload");
    assert_eq!(read_entry(&mut right_archive, "demo.png"), b"second payload");
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

fn run_line(line: &str) -> PluginResponse {
    let mut stdin = Cursor::new(line.as_bytes().to_vec());
    let mut stdout = Vec::new();
    run(&mut stdin, &mut stdout).expect("dispatch");
    let text = String::from_utf8(stdout).expect("utf8 response");
    serde_json::from_str(text.trim()).expect("parse response")
}

fn first_diagnostic(response: &PluginResponse) -> &str {
    response
        .diagnostics()
        .first()
        .expect("diagnostic present")
        .message()
}

#[test]
fn dispatcher_writes_single_jsonl_line() {
    let mut stdin = Cursor::new(b"{\"operation\":\"metadata\"}\n".to_vec());
    let mut stdout = Vec::new();
    run(&mut stdin, &mut stdout).expect("dispatch");

    let text = String::from_utf8(stdout).expect("utf8 response");
    assert!(text.ends_with('\n'));
    assert_eq!(text.trim_end_matches('\n').lines().count(), 1);
}

#[test]
fn dispatcher_answers_metadata_request() {
    let response = run_line("{\"operation\":\"metadata\"}\n");
    assert!(response.is_success());
    let PluginOutput::Metadata { record } = response.output() else {
        panic!("expected metadata output, got {:?}", response.output());
    };
    assert!(record.validate().is_ok());
}

#[test]
fn dispatcher_answers_predict_args_request() {
    let response = run_line("{\"operation\":\"predict_args\"}\n");
    assert!(response.is_success());
    let PluginOutput::Schema { arguments } = response.output() else {
        panic!("expected schema output, got {:?}", response.output());
    };
    assert!(arguments.field("accept").is_some());
    assert!(arguments.field("demo-image").is_some());
}

fn predict_line(input: &Path, accept: &str) -> String {
    format!(
        "{{\"operation\":\"predict\",\"arguments\":{{\"demo-image\":{},\"accept\":\"{accept}\"}}}}\n",
        serde_json::to_string(input).expect("encode path"),
    )
}

#[rstest]
fn dispatcher_predict_zip_leaves_readable_artifact(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response = run_line(&predict_line(&input, "application/zip"));
    assert!(response.is_success());
    let PluginOutput::Artifact { path, media_type } = response.output() else {
        panic!("expected artifact output, got {:?}", response.output());
    };
    assert_eq!(media_type.as_str(), "application/zip");

    let mut archive =
        zip::ZipArchive::new(File::open(path).expect("open artifact")).expect("read archive");
    assert_eq!(archive.len(), 2);
    assert_eq!(read_entry(&mut archive, "demo.png"), SAMPLE_BYTES);

    // The kept workspace is the host's to dispose of; do it here.
    fs::remove_dir_all(path.parent().expect("artifact parent")).expect("clean up artifact");
}

#[rstest]
fn dispatcher_predict_image_points_at_original_upload(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response = run_line(&predict_line(&input, "image/*"));
    assert!(response.is_success());
    let PluginOutput::Artifact { path, media_type } = response.output() else {
        panic!("expected artifact output, got {:?}", response.output());
    };
    assert_eq!(media_type.as_str(), "image/*");
    assert_eq!(path, &input);
    assert_eq!(fs::read(path).expect("read artifact"), SAMPLE_BYTES);
}

#[test]
fn dispatcher_rejects_missing_image_argument() {
    let response =
        run_line("{\"operation\":\"predict\",\"arguments\":{\"accept\":\"image/*\"}}\n");
    assert!(!response.is_success());
    assert!(
        first_diagnostic(&response).contains("demo-image"),
        "unexpected diagnostic: {}",
        first_diagnostic(&response)
    );
}

#[rstest]
fn dispatcher_rejects_accept_outside_choices(upload_dir: TempDir) {
    let input = write_upload(&upload_dir, "cat.png", SAMPLE_BYTES);

    let response = run_line(&predict_line(&input, "text/plain"));
    assert!(!response.is_success());
    assert!(
        first_diagnostic(&response).contains("allowed values"),
        "unexpected diagnostic: {}",
        first_diagnostic(&response)
    );
}

#[test]
fn dispatcher_rejects_unsupported_operation() {
    let response = run_line("{\"operation\":\"train\"}\n");
    assert!(!response.is_success());
    assert!(
        first_diagnostic(&response).contains("unsupported operation 'train'"),
        "unexpected diagnostic: {}",
        first_diagnostic(&response)
    );
}

#[test]
fn dispatcher_rejects_empty_input() {
    let response = run_line("");
    assert!(!response.is_success());
    assert!(
        first_diagnostic(&response).contains("request was empty"),
        "unexpected diagnostic: {}",
        first_diagnostic(&response)
    );
}

#[test]
fn dispatcher_rejects_malformed_json() {
    let response = run_line("this is not json\n");
    assert!(!response.is_success());
    assert!(
        first_diagnostic(&response).contains("invalid plugin request JSON"),
        "unexpected diagnostic: {}",
        first_diagnostic(&response)
    );
}
