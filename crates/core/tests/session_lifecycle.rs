//! Streaming session lifecycle integration tests.
//!
//! These tests drive the session manager against the mock engine:
//! start -> ready -> replaced/stopped, including starts that race each other.

use std::sync::Arc;
use std::time::Duration;

use cinebridge_core::config::StreamConfig;
use cinebridge_core::testing::{fixtures, MockEngine};
use cinebridge_core::{ProgressHub, SessionManager, SessionStatus, StartOutcome, StreamError};

struct TestHarness {
    engine: Arc<MockEngine>,
    manager: Arc<SessionManager>,
}

impl TestHarness {
    fn new() -> Self {
        let engine = Arc::new(MockEngine::new());
        let config = StreamConfig {
            progress_interval_ms: 100,
            ..Default::default()
        };
        let manager = Arc::new(SessionManager::new(
            engine.clone(),
            ProgressHub::default(),
            &config,
        ));
        Self { engine, manager }
    }
}

fn ready_url(outcome: StartOutcome) -> String {
    match outcome {
        StartOutcome::Ready { url, .. } => url,
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_starting_b_while_a_resolves_tears_a_down() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    let b = fixtures::magnet('b', "Movie B");
    harness
        .engine
        .set_files_delay(&a, Duration::from_millis(300))
        .await;

    let manager = harness.manager.clone();
    let a_clone = a.clone();
    let start_a = tokio::spawn(async move { manager.start(&a_clone, None).await });

    // let A get as far as metadata resolution
    tokio::time::sleep(Duration::from_millis(50)).await;
    let b_outcome = harness.manager.start(&b, None).await.unwrap();
    let b_url = ready_url(b_outcome);

    let a_result = start_a.await.unwrap();
    assert!(matches!(a_result, Err(StreamError::Superseded(_))));

    let active = harness.manager.active().await.unwrap();
    assert_eq!(active.identifier, b);
    assert_eq!(active.url.as_deref(), Some(b_url.as_str()));

    // A holds neither an endpoint nor an engine job
    let sessions = harness.manager.sessions().await;
    assert_eq!(sessions.len(), 1);
    assert!(!harness.engine.has_job(&fixtures::hash('a')).await);
    assert!(harness.engine.has_job(&fixtures::hash('b')).await);

    let response = reqwest::get(&b_url).await.unwrap();
    assert_eq!(response.status(), 200);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_starting_same_identifier_twice_reuses_endpoint() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");

    let first = ready_url(harness.manager.start(&a, None).await.unwrap());
    let second = ready_url(harness.manager.start(&a, None).await.unwrap());

    assert_eq!(first, second);
    assert_eq!(harness.engine.add_calls().await.len(), 1);
    assert_eq!(harness.engine.job_count().await, 1);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_duplicate_starts_share_one_endpoint() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    harness
        .engine
        .set_files_delay(&a, Duration::from_millis(100))
        .await;

    let (first, second) = tokio::join!(
        harness.manager.start(&a, None),
        harness.manager.start(&a, None)
    );

    assert_eq!(ready_url(first.unwrap()), ready_url(second.unwrap()));
    assert_eq!(harness.engine.job_count().await, 1);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_replacing_active_stream_removes_previous_job() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    let b = fixtures::magnet('b', "Movie B");

    harness.manager.start(&a, None).await.unwrap();
    harness.manager.start(&b, None).await.unwrap();

    assert_eq!(
        harness.engine.removed().await,
        vec![(fixtures::hash('a'), false)]
    );

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_stop_then_restart_adds_job_again() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");

    harness.manager.start(&a, None).await.unwrap();
    assert!(harness.manager.stop(&a).await);
    assert!(harness.manager.active().await.is_none());

    harness.manager.start(&a, None).await.unwrap();
    assert_eq!(harness.engine.add_calls().await.len(), 2);
    assert_eq!(
        harness.manager.active().await.unwrap().status,
        SessionStatus::Ready
    );

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_progress_events_flow_for_active_session() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    let mut rx = harness.manager.subscribe();

    harness.manager.start(&a, None).await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.identifier, a);
    assert_eq!(event.info_hash, fixtures::hash('a'));

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_stopping_stale_magnet_keeps_job_of_same_torrent() {
    let harness = TestHarness::new();
    // one torrent listed by two providers with different trackers
    let a1 = format!("{}&tr=udp%3A%2F%2Fone", fixtures::magnet('a', "Movie A"));
    let a2 = format!("{}&tr=udp%3A%2F%2Ftwo", fixtures::magnet('a', "Movie A"));

    let url = ready_url(harness.manager.start(&a2, None).await.unwrap());

    // a1's timed-out start is cleaned up after a2 took over
    harness.manager.stop(&a1).await;

    assert!(harness.engine.has_job(&fixtures::hash('a')).await);
    assert!(harness.engine.removed().await.is_empty());
    let active = harness.manager.active().await.unwrap();
    assert_eq!(active.identifier, a2);
    assert_eq!(active.status, SessionStatus::Ready);
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 200);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_superseded_start_of_same_torrent_keeps_new_job() {
    let harness = TestHarness::new();
    let a1 = format!("{}&tr=udp%3A%2F%2Fone", fixtures::magnet('a', "Movie A"));
    let a2 = format!("{}&tr=udp%3A%2F%2Ftwo", fixtures::magnet('a', "Movie A"));
    harness
        .engine
        .set_files_delay(&a1, Duration::from_millis(200))
        .await;

    let manager = harness.manager.clone();
    let a1_clone = a1.clone();
    let start_a1 = tokio::spawn(async move { manager.start(&a1_clone, None).await });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let url = ready_url(harness.manager.start(&a2, None).await.unwrap());
    assert!(matches!(
        start_a1.await.unwrap(),
        Err(StreamError::Superseded(_))
    ));
    harness.manager.stop(&a1).await;

    assert!(harness.engine.has_job(&fixtures::hash('a')).await);
    assert_eq!(harness.manager.active().await.unwrap().identifier, a2);
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 200);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_start_attaches_to_job_engine_already_holds() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    harness
        .engine
        .insert_job(&a, vec![("Movie.A.mkv", 4096)])
        .await;

    let outcome = harness.manager.start(&a, None).await.unwrap();
    match outcome {
        StartOutcome::Ready { file, .. } => assert_eq!(file.name, "Movie.A.mkv"),
        other => panic!("expected Ready, got {:?}", other),
    }
    assert!(harness.engine.add_calls().await.is_empty());
    assert_eq!(harness.engine.job_count().await, 1);

    harness.manager.shutdown().await;
}

#[tokio::test]
async fn test_add_reporting_existing_job_is_attached() {
    let harness = TestHarness::new();
    let a = fixtures::magnet('a', "Movie A");
    harness
        .engine
        .insert_job(&a, vec![("Movie.A.mkv", 4096)])
        .await;
    harness.engine.set_find_disabled(true).await;

    let url = ready_url(harness.manager.start(&a, None).await.unwrap());

    assert_eq!(harness.engine.add_calls().await, vec![a.clone()]);
    assert_eq!(harness.engine.job_count().await, 1);
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 200);

    harness.manager.shutdown().await;
}
