//! Functional tests for push-driven refresh.
//!
//! Core guarantees exercised here:
//! - A refresh for the displayed source triggers exactly one fetch of it.
//! - A refresh for any other source, or while nothing is displayed, triggers
//!   nothing.
//! - The displayed identity is read when the frame is processed, so a
//!   refresh for a source the user navigated away from is ignored.
//! - Frames pumped through the router reach the listener.

use sky_client::{ClientConfig, DiscardReason, ListenerDecision, PushMessage, Session};
use sky_test_utils::{source_fixture, source_path, Reply, ScriptedTransport};
use std::sync::Arc;
use tokio::sync::mpsc;

fn session_serving(ids: &[&str]) -> (Session, Arc<ScriptedTransport>) {
    let mut transport = ScriptedTransport::new();
    for id in ids {
        for _ in 0..4 {
            transport = transport.on(&source_path(id), Reply::Success(source_fixture(id)));
        }
    }
    let transport = Arc::new(transport);
    let session = Session::with_transport(ClientConfig::default(), transport.clone())
        .expect("session wiring should succeed");
    (session, transport)
}

/// Tenet: matching refresh → one fetch.
#[tokio::test]
async fn refresh_for_displayed_source_fetches_once() {
    let (session, transport) = session_serving(&["S1"]);
    session.load_source("S1").await.unwrap();

    let decision = session
        .listener()
        .on_message(&PushMessage::refresh_source("S1"))
        .await;

    assert!(decision.is_refetch());
    assert_eq!(transport.requests_to(&source_path("S1")).len(), 2);
}

/// Tenet: mismatching refresh → no fetch.
#[tokio::test]
async fn refresh_for_other_source_is_ignored() {
    let (session, transport) = session_serving(&["S1"]);
    session.load_source("S1").await.unwrap();

    let decision = session
        .listener()
        .on_message(&PushMessage::refresh_source("S2"))
        .await;

    assert_eq!(decision, ListenerDecision::Discarded(DiscardReason::OtherSource));
    assert_eq!(transport.requests().len(), 1);
}

/// Tenet: nothing displayed → no fetch.
#[tokio::test]
async fn refresh_with_nothing_loaded_is_ignored() {
    let (session, transport) = session_serving(&["S1"]);

    let decision = session
        .listener()
        .on_message(&PushMessage::refresh_source("S1"))
        .await;

    assert_eq!(decision, ListenerDecision::Discarded(DiscardReason::NothingLoaded));
    assert!(transport.requests().is_empty());
}

/// Tenet: identity is read at processing time.
///
/// After navigating from S1 to S2, a late refresh for S1 must not pull S1
/// back onto the page.
#[tokio::test]
async fn refresh_after_navigation_uses_current_identity() {
    let (session, transport) = session_serving(&["S1", "S2"]);
    session.load_source("S1").await.unwrap();
    session.load_source("S2").await.unwrap();

    let stale = session
        .listener()
        .on_message(&PushMessage::refresh_source("S1"))
        .await;
    let current = session
        .listener()
        .on_message(&PushMessage::refresh_source("S2"))
        .await;

    assert!(!stale.is_refetch());
    assert!(current.is_refetch());
    assert_eq!(transport.requests_to(&source_path("S1")).len(), 1);
    assert_eq!(transport.requests_to(&source_path("S2")).len(), 2);
    assert!(session.snapshot().is_showing("S2"));
}

/// Tenet: frames pumped through the router reach the listener.
#[tokio::test]
async fn router_pump_delivers_frames() {
    let (session, transport) = session_serving(&["S1"]);
    session.load_source("S1").await.unwrap();

    let (tx, rx) = mpsc::channel(4);
    let frames = [
        r#"{"actionType": "skyportal/REFRESH_SOURCE", "payload": {"obj_id": "S1"}}"#,
        r#"{"actionType": "skyportal/REFRESH_SOURCE", "payload": {"obj_id": "S9"}}"#,
        r#"{"actionType": "baselayer/SHOW_NOTIFICATION", "payload": {"note": "hi"}}"#,
    ];
    for frame in frames {
        tx.send(PushMessage::from_json(frame).unwrap()).await.unwrap();
    }
    drop(tx);

    assert_eq!(session.listen(rx).await, 3);
    assert_eq!(transport.requests_to(&source_path("S1")).len(), 2);
    assert_eq!(transport.requests().len(), 2);
}
