//! Functional tests for comment attachments.
//!
//! Core guarantees exercised here:
//! - A comment with a file is posted only after the file has been read and
//!   encoded, and exactly once.
//! - A comment without a file is posted directly; no file is ever read.
//! - A file that cannot be read fails the operation before anything is sent.
//! - The posted body carries the file as `{body, name}` with a base64 data
//!   URL that decodes back to the original bytes.

use sky_client::{decode_data_url, ClientConfig, ClientError, CommentForm, Session};
use sky_protocol::OperationKind;
use sky_test_utils::{CallLog, FailingFile, Gate, GatedFile, ScriptedTransport};
use std::sync::Arc;

fn session(log: &CallLog) -> (Session, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new().with_log(log.clone()));
    let session = Session::with_transport(ClientConfig::default(), transport.clone())
        .expect("session wiring should succeed");
    (session, transport)
}

/// Wait until `log` holds an entry starting with `prefix`.
async fn until_logged(log: &CallLog, prefix: &str) {
    while log.count(prefix) == 0 {
        tokio::task::yield_now().await;
    }
}

/// Tenet: the POST waits for the encoder.
///
/// While the file read is blocked, no request may be in flight. Once the
/// read completes, exactly one POST follows.
#[tokio::test]
async fn post_issued_only_after_encoding_completes() {
    let log = CallLog::new();
    let gate = Gate::new();
    let (session, transport) = session(&log);
    let file = GatedFile::new(
        "spectrum.bin",
        vec![0xde, 0xad, 0xbe, 0xef],
        gate.clone(),
        log.clone(),
    );
    let form = CommentForm::new("ZTF21aaa", "see attached").with_attachment(Arc::new(file));

    let actions = session.actions().clone();
    let task = tokio::spawn(async move { actions.add_comment(form).await });

    until_logged(&log, "read spectrum.bin").await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(log.count("POST"), 0, "request must not precede the file read");

    gate.open();
    let outcome = task.await.unwrap().unwrap();

    assert_eq!(outcome.kind(), OperationKind::Ok);
    assert_eq!(
        log.entries(),
        vec!["read spectrum.bin", "read done spectrum.bin", "POST /api/comment"]
    );

    let requests = transport.requests_to("/api/comment");
    assert_eq!(requests.len(), 1);
    let payload = requests[0].payload.clone().unwrap();
    assert_eq!(payload["attachment"]["name"], "spectrum.bin");
    let body = payload["attachment"]["body"].as_str().unwrap();
    assert_eq!(decode_data_url(body).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
}

/// Tenet: without an attachment the POST is immediate.
#[tokio::test]
async fn post_without_attachment_never_reads() {
    let log = CallLog::new();
    let (session, transport) = session(&log);

    let outcome = session
        .actions()
        .add_comment(CommentForm::new("ZTF21aaa", "interesting"))
        .await
        .unwrap();

    assert_eq!(outcome.kind(), OperationKind::Ok);
    assert_eq!(log.entries(), vec!["POST /api/comment"]);
    let payload = transport.requests()[0].payload.clone().unwrap();
    assert!(payload.get("attachment").is_none());
}

/// Tenet: unreadable files fail closed.
#[tokio::test]
async fn unreadable_file_sends_nothing() {
    let log = CallLog::new();
    let (session, transport) = session(&log);
    let form = CommentForm::new("ZTF21aaa", "broken")
        .with_attachment(Arc::new(FailingFile::new("gone.png")));

    let err = session.actions().add_comment(form).await.unwrap_err();

    assert!(matches!(err, ClientError::Encode(_)));
    assert!(transport.requests().is_empty());
    assert_eq!(session.store().version(), 0);
}
