// tests/api_status.rs
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use chrono::{TimeZone, Utc};
use http::{Request, StatusCode};
use tower::ServiceExt;

use atbat_tracker::config::Mode;
use atbat_tracker::{router, StatusBoard};

async fn get(board: Arc<StatusBoard>, uri: &str) -> (StatusCode, String) {
    let resp = router(board)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn health_is_ok() {
    let board = Arc::new(StatusBoard::new(Mode::Synthetic, "Francisco Lindor"));
    let (status, body) = get(board, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn index_before_first_cycle() {
    let board = Arc::new(StatusBoard::new(Mode::Synthetic, "Francisco Lindor"));
    let (status, body) = get(board, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Francisco Lindor Tracker\nStatus: Initializing...\nMode: SYNTHETIC\n"
    );
}

#[tokio::test]
async fn index_and_json_reflect_last_cycle() {
    let board = Arc::new(StatusBoard::new(Mode::Live, "Juan Soto"));
    let ts = Utc.with_ymd_and_hms(2025, 6, 1, 23, 14, 5).unwrap();
    board.update(|s| {
        s.last_checked_at = Some(ts);
        s.last_outcome = "Found 1 new at-bat(s): Walk".into();
        s.processed_total = 4;
        s.published_total = 3;
        s.publish_failures_total = 1;
    });

    let (_, index) = get(board.clone(), "/").await;
    assert!(index.contains("Status: Last check: 2025-06-01 23:14:05 - Found 1 new at-bat(s): Walk"));
    assert!(index.ends_with("Mode: LIVE\n"));

    let (status, body) = get(board, "/status").await;
    assert_eq!(status, StatusCode::OK);
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["mode"], "live");
    assert_eq!(v["subject"], "Juan Soto");
    assert_eq!(v["phase"], "IDLE");
    assert_eq!(v["processed_total"], 4);
    assert_eq!(v["published_total"], 3);
    assert_eq!(v["publish_failures_total"], 1);
    assert_eq!(v["last_outcome"], "Found 1 new at-bat(s): Walk");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let board = Arc::new(StatusBoard::new(Mode::Synthetic, "Francisco Lindor"));
    let (status, _) = get(board, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
