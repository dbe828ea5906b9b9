//! Integration tests for `AsyncResource` running in a `Store`

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use serde::Deserialize;
use serde_json::{json, Value};
use state_kit_core::environment::{HttpError, HttpResponse};
use state_kit_hooks::{AsyncResource, FetchEnvironment};
use state_kit_runtime::StoreError;
use state_kit_testing::{init_test_tracing, MockHttpClient};
use std::sync::Arc;
use std::time::Duration;

const SETTLE: Duration = Duration::from_secs(2);

fn env(http: &MockHttpClient) -> FetchEnvironment {
    FetchEnvironment::new(Arc::new(http.clone()))
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
}

#[tokio::test]
async fn test_success_settles_with_data() {
    init_test_tracing();
    let http = MockHttpClient::new().with_json("https://api.test/a", r#"{"a":1}"#);

    let resource = AsyncResource::<Value>::create("https://api.test/a", env(&http))
        .await
        .unwrap();
    let state = resource.settled(SETTLE).await.unwrap();

    assert_eq!(state.data, Some(json!({"a": 1})));
    assert!(!state.loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_typed_data() {
    let http = MockHttpClient::new().with_json(
        "https://api.test/users",
        r#"[{"id":1,"name":"Leanne","email":"l@example.test"},{"id":2,"name":"Ervin"}]"#,
    );

    let users = AsyncResource::<Vec<User>>::create("https://api.test/users", env(&http))
        .await
        .unwrap();
    let state = users.settled(SETTLE).await.unwrap();

    let names: Vec<_> = state.data.unwrap().into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["Leanne", "Ervin"]);
}

#[tokio::test]
async fn test_not_found_settles_with_error() {
    let http = MockHttpClient::new().with_status("https://api.test/missing", 404, "nope");

    let resource = AsyncResource::<Value>::create("https://api.test/missing", env(&http))
        .await
        .unwrap();
    let state = resource.settled(SETTLE).await.unwrap();

    assert_eq!(state.data, None);
    assert!(!state.loading);
    assert!(state.error.unwrap().contains("404"));
}

#[tokio::test]
async fn test_shape_mismatch_settles_with_error() {
    let http = MockHttpClient::new().with_json("https://api.test/users", r#"{"id":"x"}"#);

    let users = AsyncResource::<Vec<User>>::create("https://api.test/users", env(&http))
        .await
        .unwrap();
    let state = users.settled(SETTLE).await.unwrap();

    assert_eq!(state.data, None);
    assert!(state.error.unwrap().starts_with("invalid response body"));
}

#[tokio::test]
async fn test_refetch_is_loading_before_it_settles() {
    let url = "https://api.test/a";
    let http = MockHttpClient::new().with_json(url, r#"{"v":1}"#);

    let resource = AsyncResource::<Value>::create(url, env(&http)).await.unwrap();
    let first = resource.settled(SETTLE).await.unwrap();
    assert!(!first.loading);

    let gate = http.enqueue_gated(url, Err(HttpError::Network("reset".into())));
    resource.refetch().await.unwrap();

    let during = resource.snapshot().await;
    assert!(during.loading);
    assert_eq!(during.error, None);
    assert_eq!(during.data, Some(json!({"v": 1})));

    gate.release();
    let after = resource.settled(SETTLE).await.unwrap();
    assert_eq!(after.data, None);
    assert_eq!(after.error.as_deref(), Some("network error: reset"));

    // The next refetch clears the error right away
    let gate = http.enqueue_gated(url, Ok(HttpResponse::new(200, r#"{"v":2}"#)));
    resource.refetch().await.unwrap();
    assert_eq!(resource.snapshot().await.error, None);

    gate.release();
    let recovered = resource.settled(SETTLE).await.unwrap();
    assert_eq!(recovered.data, Some(json!({"v": 2})));
    assert_eq!(http.call_count(url), 3);
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(SETTLE, async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_superseded_cycle_cannot_overwrite_newer_result() {
    let url = "https://api.test/race";
    let http = MockHttpClient::new();
    let slow = http.enqueue_gated(url, Ok(HttpResponse::new(200, r#""stale""#)));
    let fast = http.enqueue_gated(url, Ok(HttpResponse::new(200, r#""fresh""#)));

    let resource = AsyncResource::<String>::create(url, env(&http)).await.unwrap();
    wait_until(|| http.call_count(url) == 1).await;
    resource.refetch().await.unwrap();
    wait_until(|| http.call_count(url) == 2).await;

    // The newer cycle settles first, the older one afterwards
    fast.release();
    let state = resource.settled(SETTLE).await.unwrap();
    assert_eq!(state.data.as_deref(), Some("fresh"));

    slow.release();
    wait_until(|| resource.in_flight() == 0).await;

    let state = resource.snapshot().await;
    assert_eq!(state.data.as_deref(), Some("fresh"));
    assert!(!state.loading);
    assert_eq!(state.cycle, 2);
}

#[tokio::test]
async fn test_url_change_starts_new_cycle() {
    let http = MockHttpClient::new()
        .with_json("https://api.test/1", r#"{"id":1}"#)
        .with_json("https://api.test/2", r#"{"id":2}"#);

    let resource = AsyncResource::<Value>::create("https://api.test/1", env(&http))
        .await
        .unwrap();
    let _ = resource.settled(SETTLE).await.unwrap();

    resource.set_url("https://api.test/1").await.unwrap();
    assert!(!resource.snapshot().await.loading);

    resource.set_url("https://api.test/2").await.unwrap();
    let state = resource.settled(SETTLE).await.unwrap();

    assert_eq!(state.data, Some(json!({"id": 2})));
    assert_eq!(
        http.calls(),
        vec!["https://api.test/1".to_string(), "https://api.test/2".to_string()]
    );
}

#[tokio::test]
async fn test_settled_times_out_while_request_is_held() {
    let url = "https://api.test/slow";
    let http = MockHttpClient::new();
    let _gate = http.enqueue_gated(url, Ok(HttpResponse::new(200, "1")));

    let resource = AsyncResource::<Value>::create(url, env(&http)).await.unwrap();

    let result = resource.settled(Duration::from_millis(30)).await;
    assert!(matches!(result, Err(StoreError::Timeout)));
    assert!(resource.snapshot().await.loading);
}

#[tokio::test]
async fn test_same_url_during_refetch_still_waits_for_the_cycle() {
    let url = "https://api.test/n";
    let http = MockHttpClient::new().with_json(url, "1");

    let resource = AsyncResource::<Value>::create(url, env(&http)).await.unwrap();
    let _ = resource.settled(SETTLE).await.unwrap();

    let gate = http.enqueue_gated(url, Ok(HttpResponse::new(200, "2")));
    resource.refetch().await.unwrap();
    // Starts no cycle of its own
    resource.set_url(url).await.unwrap();

    let waiter = {
        let resource = resource.clone();
        tokio::spawn(async move { resource.settled(SETTLE).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    gate.release();
    let state = waiter.await.unwrap().unwrap();

    assert_eq!(state.data, Some(json!(2)));
    assert_eq!(state.cycle, 2);
}

#[tokio::test]
async fn test_settled_waits_for_cycles_started_by_clones() {
    let url = "https://api.test/shared";
    let http = MockHttpClient::new().with_json(url, r#""first""#);

    let resource = AsyncResource::<String>::create(url, env(&http)).await.unwrap();
    let _ = resource.settled(SETTLE).await.unwrap();

    let older = http.enqueue_gated(url, Ok(HttpResponse::new(200, r#""older""#)));
    let newer = http.enqueue_gated(url, Ok(HttpResponse::new(200, r#""newer""#)));
    let other = resource.clone();
    resource.refetch().await.unwrap();
    wait_until(|| http.call_count(url) == 2).await;
    other.refetch().await.unwrap();
    wait_until(|| http.call_count(url) == 3).await;

    let waiter = {
        let resource = resource.clone();
        tokio::spawn(async move { resource.settled(SETTLE).await })
    };

    // The superseded cycle settling does not end the wait
    older.release();
    wait_until(|| resource.in_flight() == 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    newer.release();
    let state = waiter.await.unwrap().unwrap();
    assert_eq!(state.data.as_deref(), Some("newer"));
    assert_eq!(state.cycle, 3);
}
