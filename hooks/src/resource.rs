//! Async resource
//!
//! Wraps one network retrieval into a state machine with `data`, `loading`
//! and `error` fields plus a manual refetch.
//!
//! ## Request cycles
//!
//! Every [`ResourceAction::Fetch`] (and every [`ResourceAction::SetUrl`]
//! that changes the URL) starts a new cycle: `loading` becomes `true`,
//! `error` is cleared, and the cycle number is bumped. The retrieval runs as
//! an [`Effect::Future`] and feeds back [`ResourceAction::Settled`] tagged
//! with the cycle it belongs to.
//!
//! Only the latest cycle may settle the resource. A completion from a
//! superseded cycle is discarded, so a slow stale request can never
//! overwrite a newer result.
//!
//! Data from the previous cycle stays visible while a refetch is in flight
//! and is replaced when the new cycle settles. `data` and `error` are never
//! both present.

use serde::de::DeserializeOwned;
use state_kit_core::environment::{HttpClient, HttpError};
use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use state_kit_runtime::{Store, StoreError};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Why a request cycle failed
///
/// The `Display` rendering is what ends up in [`ResourceState::error`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request never produced a response
    #[error("network error: {0}")]
    Network(String),

    /// The response status was outside 200-299
    #[error("HTTP error: status {0}")]
    Status(u16),

    /// The body did not decode as the expected JSON shape
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<HttpError> for FetchError {
    fn from(error: HttpError) -> Self {
        Self::Network(error.to_string())
    }
}

/// GET `url` and decode a successful response body as JSON
///
/// # Errors
///
/// - [`FetchError::Network`] if the request fails
/// - [`FetchError::Status`] for a non-2xx status
/// - [`FetchError::Decode`] if the body is not valid JSON for `T`
pub async fn fetch_json<T: DeserializeOwned>(
    http: &dyn HttpClient,
    url: &str,
) -> Result<T, FetchError> {
    let response = http.get(url).await?;

    if !response.is_success() {
        return Err(FetchError::Status(response.status));
    }

    serde_json::from_slice(&response.body).map_err(|e| FetchError::Decode(e.to_string()))
}

/// State of an async resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    /// Source the resource is bound to
    pub url: String,
    /// Result of the last successful cycle
    pub data: Option<T>,
    /// A cycle is in flight
    pub loading: bool,
    /// Message from the last failed cycle
    pub error: Option<String>,
    /// Number of the latest cycle started (0 before the first)
    pub cycle: u64,
}

impl<T> ResourceState<T> {
    /// Create the state for a resource bound to `url`
    ///
    /// Starts with `loading = true`: the first cycle is expected to be
    /// started right away.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            data: None,
            loading: true,
            error: None,
            cycle: 0,
        }
    }
}

/// Async resource actions
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceAction<T> {
    /// Start a new request cycle against the current URL
    Fetch,
    /// Bind a new URL; starts a cycle only if the URL changed
    SetUrl(String),
    /// A request cycle finished
    Settled {
        /// Cycle the result belongs to
        cycle: u64,
        /// Decoded data, or the failure message
        result: Result<T, String>,
    },
}

/// Environment for [`ResourceReducer`]
#[derive(Clone)]
pub struct FetchEnvironment {
    /// Network retrieval collaborator
    pub http: Arc<dyn HttpClient>,
}

impl FetchEnvironment {
    /// Create an environment retrieving through `http`
    #[must_use]
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }
}

/// Reducer for [`ResourceState`]
#[derive(Debug)]
pub struct ResourceReducer<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> ResourceReducer<T> {
    /// Create a new resource reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for ResourceReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ResourceReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> ResourceReducer<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn start_cycle(
        state: &mut ResourceState<T>,
        env: &FetchEnvironment,
    ) -> SmallVec<[Effect<ResourceAction<T>>; 4]> {
        state.cycle += 1;
        state.loading = true;
        state.error = None;

        let cycle = state.cycle;
        let url = state.url.clone();
        let http = Arc::clone(&env.http);

        tracing::debug!(url = %url, cycle, "Starting request cycle");
        metrics::counter!("resource.cycles.started").increment(1);

        smallvec![Effect::Future(Box::pin(async move {
            let result = fetch_json::<T>(http.as_ref(), &url)
                .await
                .map_err(|e| e.to_string());
            Some(ResourceAction::Settled { cycle, result })
        }))]
    }
}

impl<T> Reducer for ResourceReducer<T>
where
    T: DeserializeOwned + Send + 'static,
{
    type State = ResourceState<T>;
    type Action = ResourceAction<T>;
    type Environment = FetchEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            ResourceAction::Fetch => Self::start_cycle(state, env),
            ResourceAction::SetUrl(url) => {
                if url == state.url {
                    return smallvec![Effect::None];
                }
                state.url = url;
                Self::start_cycle(state, env)
            },
            ResourceAction::Settled { cycle, result } => {
                if cycle != state.cycle {
                    tracing::debug!(
                        cycle,
                        latest = state.cycle,
                        "Discarding result of superseded cycle"
                    );
                    metrics::counter!("resource.cycles.discarded").increment(1);
                    return smallvec![Effect::None];
                }

                state.loading = false;
                match result {
                    Ok(data) => {
                        state.data = Some(data);
                        state.error = None;
                    },
                    Err(message) => {
                        tracing::debug!(url = %state.url, cycle, error = %message, "Request cycle failed");
                        state.data = None;
                        state.error = Some(message);
                    },
                }

                smallvec![Effect::None]
            },
        }
    }
}

/// Handle to an async resource running in its own store
///
/// Creating the handle starts the first cycle. Clones share the resource.
pub struct AsyncResource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    store: Store<ResourceState<T>, ResourceAction<T>, FetchEnvironment, ResourceReducer<T>>,
}

impl<T> AsyncResource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind to `url` and start the first request cycle
    ///
    /// # Errors
    ///
    /// Only fails if the new store rejects the first fetch, which it does not
    /// do before shutdown.
    pub async fn create(url: impl Into<String>, env: FetchEnvironment) -> Result<Self, StoreError> {
        let store = Store::new(ResourceState::new(url), ResourceReducer::new(), env);
        store.send(ResourceAction::Fetch).await?;

        Ok(Self { store })
    }

    /// Start a new request cycle
    ///
    /// When this returns, the resource is loading and its error is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn refetch(&self) -> Result<(), StoreError> {
        self.store.send(ResourceAction::Fetch).await
    }

    /// Bind a new URL, starting a cycle if it differs from the current one
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn set_url(&self, url: impl Into<String>) -> Result<(), StoreError> {
        self.store.send(ResourceAction::SetUrl(url.into())).await
    }

    /// Current state
    pub async fn snapshot(&self) -> ResourceState<T> {
        self.store.state(Clone::clone).await
    }

    /// Wait until the latest cycle has settled and return the settled state
    ///
    /// Returns at once if nothing is loading. A cycle started by any clone
    /// while waiting is waited for too.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no cycle settles within `timeout`
    /// - [`StoreError::ChannelClosed`] if the store stops broadcasting
    pub async fn settled(&self, timeout: Duration) -> Result<ResourceState<T>, StoreError> {
        // Subscribe before looking, so a settlement between the two is not missed
        let mut settlements = self.store.subscribe_actions();

        tokio::time::timeout(timeout, async {
            loop {
                let state = self.snapshot().await;
                if !state.loading {
                    return Ok(state);
                }

                match settlements.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Number of request cycles still running, superseded ones included
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.store.pending_effects()
    }

    /// Wait for in-flight cycles, then stop accepting actions
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if requests are still running
    /// when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl<T> Clone for AsyncResource<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}
