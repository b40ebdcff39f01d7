//! End-to-end tests of the draft lifecycle through the public API.

mod common;

use std::io::Write;
use std::time::Duration;

use mailcomposer::{
    Composer, ComposerConfig, DeliveryError, Field, OperationError, PendingFile,
    SubmissionStatus, SubmitError, ValidationError,
};

use common::{fill_draft, open_composer, ScriptedGateway, RESET_DELAY};

const MIB: usize = 1024 * 1024;

#[tokio::test(start_paused = true)]
async fn test_successful_send_resets_after_delay() {
    let gateway = ScriptedGateway::new();
    let composer = open_composer(gateway.clone());
    fill_draft(&composer, "a@b.com", "Hi", "Hello");

    composer.submit().await.unwrap();
    assert_eq!(composer.status(), SubmissionStatus::Succeeded);
    assert_eq!(gateway.calls(), 1);

    tokio::time::sleep(RESET_DELAY + Duration::from_millis(1)).await;

    let draft = composer.draft();
    assert_eq!(composer.status(), SubmissionStatus::Idle);
    assert_eq!(draft.recipient, "");
    assert_eq!(draft.subject, "");
    assert_eq!(draft.body, "");
    assert!(draft.attachments.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_custom_reset_delay() {
    let gateway = ScriptedGateway::new();
    let composer = Composer::open(Some(gateway), &ComposerConfig { reset_delay_ms: 500 });
    fill_draft(&composer, "a@b.com", "Hi", "Hello");

    composer.submit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(501)).await;
    assert!(composer.draft().is_empty());
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_gateway() {
    let gateway = ScriptedGateway::new();
    let composer = open_composer(gateway.clone());
    composer.set_recipient("not-an-email").unwrap();

    let err = composer.submit().await.unwrap_err();
    let SubmitError::Invalid(report) = err else {
        panic!("expected validation errors, got {err:?}");
    };

    assert_eq!(gateway.calls(), 0);
    assert_eq!(report.len(), 3);
    assert_eq!(
        report.get(Field::Recipient),
        Some(ValidationError::MalformedAddress)
    );
    assert_eq!(report.get(Field::Subject), Some(ValidationError::Empty));
    assert_eq!(report.get(Field::Body), Some(ValidationError::Empty));

    let view = composer.view();
    assert_eq!(view.field_errors[&Field::Recipient], "Invalid email format");
    assert_eq!(view.field_errors[&Field::Subject], "Subject is required");
    assert_eq!(view.field_errors[&Field::Body], "Message body is required");
    assert!(view
        .last_error
        .as_deref()
        .unwrap()
        .starts_with("Please fix the errors in the form"));
}

#[tokio::test]
async fn test_failure_keeps_draft_for_retry() {
    let gateway = ScriptedGateway::with_script(vec![Err(DeliveryError::Connection(
        "connection refused".to_string(),
    ))]);
    let composer = open_composer(gateway.clone());
    fill_draft(&composer, "a@b.com", "Hi", "Hello");
    composer
        .add_attachments(vec![PendingFile::from_bytes("notes.txt", b"abc".to_vec())])
        .unwrap();
    let before = composer.draft();

    composer.submit().await.unwrap_err();
    assert_eq!(composer.draft(), before);
    assert_eq!(
        composer.last_error().as_deref(),
        Some("could not connect to the mail server: connection refused")
    );

    // The retry sends the same content without re-entering anything.
    composer.submit().await.unwrap();
    assert_eq!(composer.status(), SubmissionStatus::Succeeded);
    let sent = gateway.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
}

#[tokio::test]
async fn test_file_attachments_pass_through_unmodified() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"quarterly figures").unwrap();

    let gateway = ScriptedGateway::new();
    let composer = open_composer(gateway.clone());
    fill_draft(&composer, "a@b.com", "Report", "See attached");
    let report = composer
        .add_attachments(vec![
            PendingFile::new("report.csv", mailcomposer::AttachmentContent::from_path(file.path())),
            PendingFile::from_bytes("logo.png", vec![7u8; 16]),
        ])
        .unwrap();
    assert!(report.is_complete());

    composer.submit().await.unwrap();

    let sent = &gateway.sent()[0];
    assert_eq!(sent.attachments.len(), 2);
    assert_eq!(sent.attachments[0].name, "report.csv");
    assert_eq!(sent.attachments[0].size_bytes, 17);
    assert_eq!(
        sent.attachments[0].content.read().await.unwrap(),
        b"quarterly figures"
    );
    assert_eq!(sent.attachments[1].content.read().await.unwrap(), vec![7u8; 16]);
}

#[tokio::test]
async fn test_oversized_file_is_rejected_at_add_time() {
    let composer = open_composer(ScriptedGateway::new());
    composer
        .add_attachments(vec![PendingFile::from_bytes("a.bin", vec![0u8; 10])])
        .unwrap();

    let report = composer
        .add_attachments(vec![PendingFile::from_bytes(
            "big.bin",
            vec![0u8; 20 * MIB + 1],
        )])
        .unwrap();

    assert_eq!(report.added, 0);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(composer.draft().attachments.len(), 1);
}

#[tokio::test]
async fn test_aggregate_size_blocks_submit() {
    let gateway = ScriptedGateway::new();
    let composer = open_composer(gateway.clone());
    fill_draft(&composer, "a@b.com", "Big", "Two large files");
    let report = composer
        .add_attachments(vec![
            PendingFile::from_bytes("one.bin", vec![0u8; 13 * MIB]),
            PendingFile::from_bytes("two.bin", vec![0u8; 13 * MIB]),
        ])
        .unwrap();
    assert!(report.is_complete());

    let err = composer.submit().await.unwrap_err();
    let SubmitError::Invalid(report) = err else {
        panic!("expected validation errors");
    };
    assert!(matches!(
        report.get(Field::Attachments),
        Some(ValidationError::AggregateTooLarge { .. })
    ));
    assert_eq!(gateway.calls(), 0);

    composer.remove_attachment(1).unwrap();
    assert!(composer.is_valid());
    composer.submit().await.unwrap();
}

#[tokio::test]
async fn test_too_many_attachments_blocks_submit() {
    let composer = open_composer(ScriptedGateway::new());
    fill_draft(&composer, "a@b.com", "Files", "Lots of files");
    let files: Vec<PendingFile> = (0..11)
        .map(|i| PendingFile::from_bytes(format!("f{i}.txt"), vec![1u8]))
        .collect();
    composer.add_attachments(files).unwrap();

    let view = composer.view();
    assert!(!view.is_valid);
    assert_eq!(
        view.field_errors[&Field::Attachments],
        "Maximum 10 files allowed"
    );
}

#[tokio::test]
async fn test_unconfigured_composer_reports_not_configured() {
    let composer = Composer::open(None, &ComposerConfig::default());
    fill_draft(&composer, "a@b.com", "Hi", "Hello");

    assert_eq!(
        composer.submit().await.unwrap_err(),
        SubmitError::Operation(OperationError::NotConfigured)
    );
    assert_eq!(composer.status(), SubmissionStatus::Idle);

    composer.set_gateway(ScriptedGateway::new());
    composer.submit().await.unwrap();
}

#[tokio::test]
async fn test_view_serializes() {
    let composer = open_composer(ScriptedGateway::new());
    fill_draft(&composer, "a@b.com", "Hi", "Hello");
    composer
        .add_attachments(vec![PendingFile::from_bytes("a.txt", vec![0u8; 1536])])
        .unwrap();

    let json = serde_json::to_value(composer.view()).unwrap();
    assert_eq!(json["recipient"], "a@b.com");
    assert_eq!(json["status"]["state"], "idle");
    assert_eq!(json["attachments"][0]["size"], "1.5 KB");
    assert_eq!(json["total_attachment_size"], 1536);
    assert_eq!(json["is_valid"], true);
    assert_eq!(json["is_configured"], true);
}
