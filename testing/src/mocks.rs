//! Mock implementations of Environment traits
//!
//! - [`MockHttpClient`]: scripted GET replies, with optional gates to control
//!   when a reply is delivered
//! - [`FailingStorage`]: a durable store whose every operation fails

use state_kit_core::environment::{
    HttpClient, HttpError, HttpResponse, KeyValueStore, StorageError,
};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

type Reply = Result<HttpResponse, HttpError>;

struct Scripted {
    reply: Reply,
    gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct Routes {
    /// Reply served whenever nothing is queued for the URL
    fixed: HashMap<String, Reply>,
    /// One-shot replies, served before the fixed reply
    queued: HashMap<String, VecDeque<Scripted>>,
    /// Every URL requested, in order
    calls: Vec<String>,
}

/// Scripted network retrieval collaborator
///
/// Each URL can have a fixed reply and a queue of one-shot replies. Queued
/// replies are served first, in order. A gated reply is held until its
/// [`ReplyGate`] is released, which lets a test settle request cycles out
/// of order.
///
/// # Example
///
/// ```
/// use state_kit_core::environment::HttpClient;
/// use state_kit_testing::MockHttpClient;
///
/// # tokio_test::block_on(async {
/// let http = MockHttpClient::new()
///     .with_json("https://api.test/a", r#"{"a":1}"#)
///     .with_status("https://api.test/missing", 404, "not found");
///
/// let ok = http.get("https://api.test/a").await.unwrap();
/// assert_eq!(ok.status, 200);
///
/// let missing = http.get("https://api.test/missing").await.unwrap();
/// assert_eq!(missing.status, 404);
/// assert_eq!(http.call_count("https://api.test/a"), 1);
/// # });
/// ```
#[derive(Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<Routes>>,
}

impl MockHttpClient {
    /// Create a client with no routes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`
    #[must_use]
    pub fn with_json(self, url: impl Into<String>, body: &str) -> Self {
        self.with_status(url, 200, body)
    }

    /// Serve `body` with the given status for `url`
    #[must_use]
    pub fn with_status(self, url: impl Into<String>, status: u16, body: &str) -> Self {
        self.routes()
            .fixed
            .insert(url.into(), Ok(HttpResponse::new(status, body.as_bytes())));
        self
    }

    /// Fail every request to `url` with a network error
    #[must_use]
    pub fn with_network_error(self, url: impl Into<String>, message: &str) -> Self {
        self.routes()
            .fixed
            .insert(url.into(), Err(HttpError::Network(message.to_string())));
        self
    }

    /// Queue a one-shot reply for `url`
    pub fn enqueue(&self, url: impl Into<String>, reply: Result<HttpResponse, HttpError>) {
        self.routes()
            .queued
            .entry(url.into())
            .or_default()
            .push_back(Scripted { reply, gate: None });
    }

    /// Queue a one-shot reply for `url` that is held until the returned gate is released
    #[must_use]
    pub fn enqueue_gated(
        &self,
        url: impl Into<String>,
        reply: Result<HttpResponse, HttpError>,
    ) -> ReplyGate {
        let gate = Arc::new(Notify::new());
        self.routes()
            .queued
            .entry(url.into())
            .or_default()
            .push_back(Scripted {
                reply,
                gate: Some(Arc::clone(&gate)),
            });
        ReplyGate { notify: gate }
    }

    /// Every URL requested so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.routes().calls.clone()
    }

    /// Number of requests made to `url`
    #[must_use]
    pub fn call_count(&self, url: &str) -> usize {
        self.routes().calls.iter().filter(|called| *called == url).count()
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HttpClient for MockHttpClient {
    fn get(
        &self,
        url: &str,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + '_>> {
        let scripted = {
            let mut routes = self.routes();
            routes.calls.push(url.to_string());

            let queued = routes.queued.get_mut(url).and_then(VecDeque::pop_front);
            queued.unwrap_or_else(|| Scripted {
                reply: routes.fixed.get(url).cloned().unwrap_or_else(|| {
                    Err(HttpError::Network(format!("no mock response for {url}")))
                }),
                gate: None,
            })
        };

        Box::pin(async move {
            if let Some(gate) = scripted.gate {
                gate.notified().await;
            }
            scripted.reply
        })
    }
}

/// Releases a gated reply queued with [`MockHttpClient::enqueue_gated`]
#[derive(Clone)]
pub struct ReplyGate {
    notify: Arc<Notify>,
}

impl ReplyGate {
    /// Let the held reply through
    ///
    /// May be called before the request is made; the reply is then delivered
    /// as soon as it is requested.
    pub fn release(&self) {
        self.notify.notify_one();
    }
}

/// Durable store whose every operation fails
///
/// Reads report the store as unavailable, writes report the quota as exceeded.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStorage;

impl FailingStorage {
    /// Create a failing store
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyValueStore for FailingStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("storage offline".to_string()))
    }

    fn set(&self, _key: &str, value: &str) -> Result<(), StorageError> {
        Err(StorageError::QuotaExceeded {
            needed: value.len(),
            limit: 0,
        })
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("storage offline".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unknown_url_is_network_error() {
        let http = MockHttpClient::new();

        let result = http.get("https://nowhere.test").await;

        assert!(matches!(result, Err(HttpError::Network(msg)) if msg.contains("nowhere.test")));
    }

    #[tokio::test]
    async fn test_queued_replies_precede_fixed_reply() {
        let http = MockHttpClient::new().with_json("u", "fixed");
        http.enqueue("u", Ok(HttpResponse::new(500, "first")));

        let first = http.get("u").await.unwrap();
        let second = http.get("u").await.unwrap();

        assert_eq!(first.status, 500);
        assert_eq!(second.body, b"fixed");
        assert_eq!(http.calls(), vec!["u".to_string(), "u".to_string()]);
    }

    #[tokio::test]
    async fn test_gated_reply_waits_for_release() {
        let http = MockHttpClient::new();
        let gate = http.enqueue_gated("u", Ok(HttpResponse::new(200, "late")));

        let pending = http.get("u");
        let held = tokio::time::timeout(Duration::from_millis(20), pending).await;
        assert!(held.is_err());

        // The reply was consumed by the abandoned request
        gate.release();
        assert!(http.get("u").await.is_err());
    }

    #[tokio::test]
    async fn test_release_before_request() {
        let http = MockHttpClient::new();
        let gate = http.enqueue_gated("u", Ok(HttpResponse::new(200, "early")));
        gate.release();

        let reply = http.get("u").await.unwrap();

        assert_eq!(reply.body, b"early");
    }

    #[test]
    fn test_failing_storage() {
        let storage = FailingStorage::new();

        assert!(storage.get("k").is_err());
        assert!(matches!(
            storage.set("k", "1234"),
            Err(StorageError::QuotaExceeded { needed: 4, limit: 0 })
        ));
        assert!(storage.remove("k").is_err());
    }
}
