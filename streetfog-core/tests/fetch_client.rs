//! Fetch client and session behaviour against a scripted transport.
//!
//! Tests run on a paused tokio clock, so backoff sleeps complete instantly
//! and cache ages are controlled with `tokio::time::advance`.

mod common;

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::*;
use streetfog_core::prelude::*;

// ============================================================================
// Mock Implementations
// ============================================================================

/// Replays scripted responses, then serves the grid fixture
#[derive(Default)]
struct MockTransport {
    responses: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
    calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
}

impl MockTransport {
    fn scripted(responses: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    fn push(&self, response: Result<Vec<u8>, FetchError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OverpassTransport for MockTransport {
    async fn post_query(&self, query: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(grid_overpass_body()))
    }
}

fn unavailable() -> Result<Vec<u8>, FetchError> {
    Err(FetchError::Status { status: 503 })
}

fn client(transport: MockTransport) -> StreetDataClient<MockTransport> {
    StreetDataClient::new(transport, FetchConfig::default(), GraphBuildConfig::default()).unwrap()
}

// ============================================================================
// StreetDataClient
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_second_fetch_within_ttl_is_cached() {
    let mut client = client(MockTransport::default());

    let first = client.fetch_graph(center(), 500.0).await.unwrap();
    assert!(!first.from_cache);
    assert!(!first.is_offline_fallback);
    assert_eq!(first.graph.segment_count(), 12);

    tokio::time::advance(Duration::from_secs(120)).await;
    let second = client.fetch_graph(center(), 500.0).await.unwrap();
    assert!(second.from_cache);
    assert!(!second.is_offline_fallback);
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_nearby_center_shares_cache_entry() {
    let mut client = client(MockTransport::default());

    client.fetch_graph(center(), 500.0).await.unwrap();
    let shifted = StreetPoint::new(center().latitude + 0.000_01, center().longitude);
    let again = client.fetch_graph(shifted, 500.0).await.unwrap();

    assert!(again.from_cache);
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_refetched() {
    let mut client = client(MockTransport::default());

    client.fetch_graph(center(), 500.0).await.unwrap();
    tokio::time::advance(Duration::from_secs(301)).await;
    let refreshed = client.fetch_graph(center(), 500.0).await.unwrap();

    assert!(!refreshed.from_cache);
    assert_eq!(client.transport().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_offline_fallback_serves_expired_entry() {
    let mut client = client(MockTransport::default());
    client.fetch_graph(center(), 500.0).await.unwrap();

    tokio::time::advance(Duration::from_secs(301)).await;
    for _ in 0..3 {
        client.transport().push(unavailable());
    }
    let fallback = client.fetch_graph(center(), 500.0).await.unwrap();

    assert!(fallback.from_cache);
    assert!(fallback.is_offline_fallback);
    assert_eq!(fallback.graph.segment_count(), 12);
    assert_eq!(client.transport().calls(), 4);
    assert_eq!(client.status(), ConnectivityStatus::Offline);
}

#[tokio::test(start_paused = true)]
async fn test_transient_errors_retried_with_backoff() {
    let transport = MockTransport::scripted(vec![unavailable(), unavailable(), unavailable()]);
    let mut client = client(transport);

    let started = tokio::time::Instant::now();
    let result = client.fetch_graph(center(), 500.0).await;

    assert!(matches!(
        result,
        Err(Error::Fetch(FetchError::Status { status: 503 }))
    ));
    assert_eq!(client.transport().calls(), 3);
    // 1 s after the first failure, 2 s after the second
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(client.status(), ConnectivityStatus::Offline);
}

#[tokio::test(start_paused = true)]
async fn test_recovers_after_transient_failure() {
    let transport = MockTransport::scripted(vec![
        Err(FetchError::Timeout("read timed out".to_string())),
        Err(FetchError::Network("connection reset".to_string())),
    ]);
    let mut client = client(transport);

    let fetched = client.fetch_graph(center(), 500.0).await.unwrap();

    assert!(!fetched.from_cache);
    assert_eq!(client.transport().calls(), 3);
    assert_eq!(client.status(), ConnectivityStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_status_not_retried() {
    let transport = MockTransport::scripted(vec![Err(FetchError::Status { status: 400 })]);
    let mut client = client(transport);

    let result = client.fetch_graph(center(), 500.0).await;

    assert!(matches!(
        result,
        Err(Error::Fetch(FetchError::Status { status: 400 }))
    ));
    assert_eq!(client.transport().calls(), 1);
    assert_eq!(client.status(), ConnectivityStatus::Online);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_body_is_fatal() {
    let transport = MockTransport::scripted(vec![Ok(b"<html>busy</html>".to_vec())]);
    let mut client = client(transport);

    let result = client.fetch_graph(center(), 500.0).await;

    assert!(matches!(result, Err(Error::Fetch(FetchError::Malformed(_)))));
    assert_eq!(client.transport().calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_evicts_oldest_area() {
    let config = FetchConfig {
        max_cache_entries: 2,
        ..Default::default()
    };
    let mut client =
        StreetDataClient::new(MockTransport::default(), config, GraphBuildConfig::default())
            .unwrap();

    let areas = [node(0, 0), node(2, 2), StreetPoint::new(LAT0 + 0.01, LON0)];
    for area in areas {
        client.fetch_graph(area, 500.0).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
    }

    assert_eq!(client.cache().len(), 2);
    assert!(!client.cache().contains(&CacheKey::new(areas[0], 500.0)));
    assert!(client.cache().contains(&CacheKey::new(areas[2], 500.0)));
}

#[tokio::test(start_paused = true)]
async fn test_invalidate_cache_forces_fetch() {
    let mut client = client(MockTransport::default());

    client.fetch_graph(center(), 500.0).await.unwrap();
    client.invalidate_cache();
    assert!(client.cache().is_empty());

    let fetched = client.fetch_graph(center(), 500.0).await.unwrap();
    assert!(!fetched.from_cache);
    assert_eq!(client.transport().calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_query_sent_to_transport() {
    let mut client = client(MockTransport::default());
    client.fetch_graph(center(), 750.0).await.unwrap();

    let query = client.transport().last_query.lock().unwrap().clone().unwrap();
    assert!(query.starts_with("[out:json][timeout:25];"));
    assert!(query.contains("(around:750,52.521000,13.401000)"));
    assert!(query.ends_with("out geom;"));
}

#[test]
fn test_invalid_config_rejected() {
    let config = FetchConfig {
        max_attempts: 0,
        ..Default::default()
    };
    let result = StreetDataClient::new(MockTransport::default(), config, GraphBuildConfig::default());
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

// ============================================================================
// ExplorationSession
// ============================================================================

fn session() -> ExplorationSession<MockTransport> {
    ExplorationSession::new(client(MockTransport::default()), TrackerConfig::default()).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_session_without_graph() {
    let mut session = session();

    assert!(session.record_path(&[GpsSample::new(center(), at(0))]) == TrackingSummary::default());
    assert!(session.nearest_segments(center(), 3, ExploredFilter::All).is_empty());
    assert_eq!(session.find_loop(center(), 1_000.0), Err(LoopError::DeadEnd));
    assert!(matches!(
        session.mark_segment_explored(1, at(0)),
        Err(Error::NoGraphLoaded)
    ));
    assert_eq!(session.coverage().total_segments, 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_explore_and_query() {
    let mut session = session();
    let load = session.load_area(center(), 500.0).await.unwrap();
    assert_eq!(load.segment_count, 12);
    assert_eq!(load.intersection_count, 9);

    let samples: Vec<GpsSample> = (0..4)
        .map(|i| GpsSample::new(center(), at(i * 5)))
        .collect();
    let summary = session.record_path(&samples);
    assert_eq!(summary.newly_explored_segments.len(), 4);

    assert!(session.mark_segment_explored(1, at(100)).unwrap());
    let corner = NodeKey::from_point(node(0, 0), DEFAULT_NODE_PRECISION);
    assert!(session.mark_intersection_explored(&corner, at(100)).unwrap());
    assert!(matches!(
        session.mark_segment_explored(999, at(100)),
        Err(Error::InvalidData(_))
    ));

    let coverage = session.coverage();
    assert_eq!(coverage.explored_segments, 5);
    assert_eq!(coverage.explored_intersections, 2);

    let unexplored = session.nearest_segments(center(), 20, ExploredFilter::Unexplored);
    assert_eq!(unexplored.len(), 7);
    assert!(session.find_loop(center(), 2_000.0).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_session_reload_keeps_exploration() {
    let mut session = session();
    session.load_area(center(), 500.0).await.unwrap();
    session.mark_segment_explored(4, at(10)).unwrap();

    // Different radius: a new cache key, fetched again
    let load = session.load_area(center(), 600.0).await.unwrap();
    assert!(!load.from_cache);
    assert!(load.carried_over > 0);
    assert_eq!(session.coverage().explored_segments, 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_reset() {
    let mut session = session();
    session.load_area(center(), 500.0).await.unwrap();

    session.reset();

    assert!(session.graph().is_none());
    assert!(session.client().cache().is_empty());
    let reload = session.load_area(center(), 500.0).await.unwrap();
    assert!(!reload.from_cache);
    assert_eq!(session.client().transport().calls(), 2);
}
