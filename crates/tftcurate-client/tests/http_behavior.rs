//! Classification and retry behavior against a scripted HTTP fixture.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::json;

use tftcurate_client::{ApiError, ClientConfig, RiotClient};
use tftcurate_types::artifact::CollectionMethod;
use tftcurate_types::ids::{CycleId, MatchId, Puuid, Region};
use tftcurate_types::window::CycleWindow;

#[derive(Clone)]
struct Fixture {
    hits: Arc<AtomicUsize>,
    /// Responses served before the endpoint starts returning 200.
    failures_before_success: usize,
    failure_status: StatusCode,
    retry_after: Option<u64>,
}

async fn scripted(State(fixture): State<Fixture>) -> (StatusCode, HeaderMap, String) {
    let hit = fixture.hits.fetch_add(1, Ordering::SeqCst);
    let mut headers = HeaderMap::new();
    if hit < fixture.failures_before_success {
        if let Some(seconds) = fixture.retry_after {
            headers.insert("Retry-After", seconds.into());
        }
        return (fixture.failure_status, headers, String::new());
    }
    (
        StatusCode::OK,
        headers,
        json!({
            "metadata": {"match_id": "LA2_1", "participants": []},
            "info": {"game_datetime": 1, "participants": []}
        })
        .to_string(),
    )
}

async fn serve(fixture: Fixture) -> String {
    let app = Router::new()
        .route("/tft/match/v1/matches/:id", get(scripted))
        .route("/tft/match/v1/matches/by-puuid/:puuid/ids", get(ids))
        .with_state(fixture);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

async fn ids(State(fixture): State<Fixture>) -> (StatusCode, HeaderMap, String) {
    fixture.hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, HeaderMap::new(), "not json at all".into())
}

fn client_for(base: &str) -> RiotClient {
    let mut config = ClientConfig::new("RGAPI-test", Region::new("la2"));
    config.regional_base = Some(base.to_string());
    config.platform_base = Some(base.to_string());
    config.backoff_base = Duration::from_millis(20);
    config.backoff_cap = Duration::from_secs(2);
    RiotClient::new(config).unwrap()
}

fn fixture(failures: usize, status: StatusCode, retry_after: Option<u64>) -> Fixture {
    Fixture {
        hits: Arc::new(AtomicUsize::new(0)),
        failures_before_success: failures,
        failure_status: status,
        retry_after,
    }
}

#[tokio::test]
async fn not_found_is_terminal_without_retry() {
    let f = fixture(100, StatusCode::NOT_FOUND, None);
    let base = serve(f.clone()).await;
    let client = client_for(&base);

    let err = client
        .match_detail(&MatchId::new("LA2_404"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound { .. }));
    assert_eq!(f.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn forbidden_surfaces_auth_expired_immediately() {
    let f = fixture(100, StatusCode::FORBIDDEN, None);
    let base = serve(f.clone()).await;
    let client = client_for(&base);

    let err = client
        .match_detail(&MatchId::new("LA2_1"))
        .await
        .unwrap_err();
    assert!(err.is_auth_expired());
    assert_eq!(f.hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let f = fixture(2, StatusCode::BAD_GATEWAY, None);
    let base = serve(f.clone()).await;
    let client = client_for(&base);

    let detail = client.match_detail(&MatchId::new("LA2_1")).await.unwrap();
    assert_eq!(detail.metadata.match_id, "LA2_1");
    assert_eq!(f.hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_cap() {
    let f = fixture(100, StatusCode::INTERNAL_SERVER_ERROR, None);
    let base = serve(f.clone()).await;
    let client = client_for(&base);

    let err = client
        .match_detail(&MatchId::new("LA2_1"))
        .await
        .unwrap_err();
    match err {
        ApiError::Server { status, attempts, .. } => {
            assert_eq!(status, 500);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected server error, got {other}"),
    }
    // Initial attempt + 3 retries.
    assert_eq!(f.hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn rate_limit_burst_honors_retry_after_and_recovers() {
    // First three responses are 429 with Retry-After: 2; afterwards 200.
    let f = fixture(3, StatusCode::TOO_MANY_REQUESTS, Some(2));
    let base = serve(f.clone()).await;
    let client = Arc::new(client_for(&base));

    let start = std::time::Instant::now();
    let mut handles = Vec::new();
    for n in 0..3 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.match_detail(&MatchId::new(format!("LA2_{n}"))).await
        }));
    }
    for handle in handles {
        // No failure surfaces to the caller.
        handle.await.unwrap().unwrap();
    }

    assert!(
        start.elapsed() >= Duration::from_secs(2),
        "Retry-After must delay the burst, elapsed {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let f = fixture(0, StatusCode::OK, None);
    let base = serve(f).await;
    let client = client_for(&base);

    let window = CycleWindow::for_cycle(
        &CycleId::new("20251101").unwrap(),
        CollectionMethod::Daily,
    );
    let err = client
        .match_ids(&Puuid::new("p1"), &window, 50)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse { .. }));
}
