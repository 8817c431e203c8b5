//! Poem endpoint integration tests.

mod common;

use std::collections::HashSet;

use axum::http::{header, HeaderName, HeaderValue, StatusCode};

use common::TestHarness;
use poembot_store::ReadRange;

fn poem_text(response: &axum_test::TestResponse) -> String {
    let body: serde_json::Value =
        serde_json::from_str(&response.text()).expect("Body should be JSON");
    body["text"]
        .as_str()
        .expect("Body should carry a text field")
        .to_string()
}

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn get_poem_returns_json_labelled_text_plain() {
    let harness = TestHarness::new();
    harness.seed_numbered(500);

    let response = harness.server.get("/poem").await;

    response.assert_status_ok();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .expect("Content-Type should be set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"), "{content_type}");
}

#[tokio::test]
async fn get_poem_returns_a_stored_poem() {
    let harness = TestHarness::new();
    let texts = harness.seed_numbered(500);

    let response = harness.server.get("/poem").await;

    response.assert_status_ok();
    let text = poem_text(&response);
    assert!(texts.contains(&text), "unexpected poem {text:?}");
}

#[tokio::test]
async fn repeated_requests_stay_within_written_set() {
    let harness = TestHarness::new();
    let texts: HashSet<String> = harness.seed_numbered(500).into_iter().collect();

    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let response = harness.server.get("/poem").await;
        response.assert_status_ok();

        let text = poem_text(&response);
        assert!(texts.contains(&text), "unexpected poem {text:?}");
        seen.insert(text);
    }

    // 1000 uniform draws over 500 poems hit far more than one of them
    assert!(seen.len() > 100, "only {} distinct poems", seen.len());
}

#[tokio::test]
async fn long_poem_is_truncated_to_1000_chars() {
    let harness = TestHarness::new();
    let long = "é".repeat(1500);
    harness.seed(&vec![long.clone(); 500]);

    let response = harness.server.get("/poem").await;

    response.assert_status_ok();
    let text = poem_text(&response);
    assert_eq!(text.chars().count(), 1000);
    assert!(long.starts_with(&text));
}

#[tokio::test]
async fn short_poem_is_returned_whole() {
    let harness = TestHarness::new();
    let poem = "Roses are red\nViolets are blue".to_string();
    harness.seed(&vec![poem.clone(); 500]);

    let response = harness.server.get("/poem").await;

    response.assert_status_ok();
    assert_eq!(poem_text(&response), poem);
}

#[tokio::test]
async fn written_range_serves_small_batches() {
    let harness = TestHarness::with_read_range(ReadRange::Written);
    let texts = harness.seed_numbered(3);

    for _ in 0..50 {
        let response = harness.server.get("/poem").await;
        response.assert_status_ok();
        assert!(texts.contains(&poem_text(&response)));
    }
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn empty_table_returns_internal_error() {
    let harness = TestHarness::new();

    let response = harness.server.get("/poem").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "internal_error");
}

#[tokio::test]
async fn missing_table_returns_internal_error() {
    let harness = TestHarness::unprovisioned(ReadRange::default());

    let response = harness.server.get("/poem").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn written_range_without_batch_returns_internal_error() {
    let harness = TestHarness::with_read_range(ReadRange::Written);

    let response = harness.server.get("/poem").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Routing and CORS
// ============================================================================

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let harness = TestHarness::new();
    harness.seed_numbered(500);

    let response = harness
        .server
        .get("/poem")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("https://poems.example"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("CORS header should be set"),
        "*"
    );
}

#[tokio::test]
async fn unknown_route_returns_not_found() {
    let harness = TestHarness::new();

    let response = harness.server.get("/health").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn post_poem_is_not_allowed() {
    let harness = TestHarness::new();

    let response = harness.server.post("/poem").await;

    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
