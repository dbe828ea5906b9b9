//! # State Kit Core
//!
//! Core traits and types for reducer-driven reactive state.
//!
//! Every piece of state in State Kit is an explicit state machine: a reducer
//! receives the current state and an action, commits the next state in place,
//! and returns descriptions of any side effects. Callers that need the new
//! value read it from the state the reducer just committed, never from a
//! snapshot captured before the update was scheduled.
//!
//! ## Core Concepts
//!
//! - **State**: The current value(s) owned by a unit
//! - **Action**: All possible inputs to a reducer
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected collaborators (durable store, network client)
//!
//! ## Example
//!
//! ```
//! use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct ClickState {
//!     clicks: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum ClickAction {
//!     Click,
//! }
//!
//! struct ClickReducer;
//!
//! impl Reducer for ClickReducer {
//!     type State = ClickState;
//!     type Action = ClickAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut ClickState,
//!         action: ClickAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<ClickAction>; 4]> {
//!         match action {
//!             ClickAction::Click => state.clicks += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = ClickState::default();
//! let _ = ClickReducer.reduce(&mut state, ClickAction::Click, &());
//! assert_eq!(state.clicks, 1);
//! ```

pub use smallvec::{smallvec, SmallVec};

/// Reducer composition utilities
pub mod composition;

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They hold all transition logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for state transitions
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This function:
        /// 1. Commits the next state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// Once `reduce` returns, `state` holds the committed value. Any
        /// composition that needs the new value reads it from `state`.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Transform the action this effect feeds back
        ///
        /// Used to lift a child reducer's effects into a parent action type.
        #[must_use]
        pub fn map<B, F>(self, f: F) -> Effect<B>
        where
            F: FnOnce(Action) -> B + Send + 'static,
            Action: Send + 'static,
            B: Send + 'static,
        {
            match self {
                Effect::None => Effect::None,
                Effect::Future(fut) => Effect::Future(Box::pin(async move { fut.await.map(f) })),
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// The two external collaborators are abstracted behind traits and injected
/// via a reducer's Environment parameter:
///
/// - [`KeyValueStore`](environment::KeyValueStore): durable, string-keyed text storage
/// - [`HttpClient`](environment::HttpClient): one-shot GET retrieval
pub mod environment {
    use std::future::Future;
    use std::pin::Pin;
    use thiserror::Error;

    /// Errors raised by a durable key-value store
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StorageError {
        /// The store could not be reached or read
        #[error("storage unavailable: {0}")]
        Unavailable(String),

        /// The write would exceed the store's capacity
        #[error("storage quota exceeded: {needed} bytes needed, {limit} bytes allowed")]
        QuotaExceeded {
            /// Bytes the store would hold after the write
            needed: usize,
            /// Configured capacity in bytes
            limit: usize,
        },

        /// Underlying I/O failed
        #[error("storage I/O failed: {0}")]
        Io(String),

        /// The backing document is not valid
        #[error("storage document is corrupt: {0}")]
        Corrupt(String),
    }

    /// Durable key-value store - opaque text keyed by string
    ///
    /// Serialization is the caller's job; the store only moves text. There is
    /// no transactional guarantee: concurrent writers to the same key are
    /// last-write-wins.
    ///
    /// # Example
    ///
    /// ```
    /// use state_kit_core::environment::{KeyValueStore, StorageError};
    /// use std::collections::HashMap;
    /// use std::sync::Mutex;
    ///
    /// struct MapStore(Mutex<HashMap<String, String>>);
    ///
    /// impl KeyValueStore for MapStore {
    ///     fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
    ///         let map = self.0.lock().map_err(|e| StorageError::Unavailable(e.to_string()))?;
    ///         Ok(map.get(key).cloned())
    ///     }
    ///
    ///     fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
    ///         let mut map = self.0.lock().map_err(|e| StorageError::Unavailable(e.to_string()))?;
    ///         map.insert(key.to_string(), value.to_string());
    ///         Ok(())
    ///     }
    ///
    ///     fn remove(&self, key: &str) -> Result<(), StorageError> {
    ///         let mut map = self.0.lock().map_err(|e| StorageError::Unavailable(e.to_string()))?;
    ///         map.remove(key);
    ///         Ok(())
    ///     }
    /// }
    /// ```
    pub trait KeyValueStore: Send + Sync {
        /// Read the text stored under `key`, if any
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] if the store cannot be read.
        fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

        /// Store `value` under `key`, replacing any previous entry
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] if the write is rejected or fails.
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

        /// Clear the entry under `key`
        ///
        /// # Errors
        ///
        /// Returns [`StorageError`] if the store cannot be written.
        fn remove(&self, key: &str) -> Result<(), StorageError>;
    }

    /// Errors raised by the network retrieval collaborator
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum HttpError {
        /// The request could not be completed
        #[error("{0}")]
        Network(String),

        /// The request did not complete in time
        #[error("request timed out")]
        Timeout,
    }

    /// Raw response from a GET
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct HttpResponse {
        /// HTTP status code
        pub status: u16,
        /// Response body bytes
        pub body: Vec<u8>,
    }

    impl HttpResponse {
        /// Create a response from a status and body
        #[must_use]
        pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
            Self {
                status,
                body: body.into(),
            }
        }

        /// Whether the status is in the 2xx range
        #[must_use]
        pub const fn is_success(&self) -> bool {
            self.status >= 200 && self.status < 300
        }
    }

    /// Network retrieval collaborator - one-shot GET
    ///
    /// Transport concerns (headers, TLS, timeouts) belong to the implementation.
    ///
    /// # Dyn Compatibility
    ///
    /// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so the
    /// client can live behind `Arc<dyn HttpClient>` and be captured by effects.
    pub trait HttpClient: Send + Sync {
        /// Perform a GET to `url`
        ///
        /// Non-success statuses are returned as responses, not errors.
        ///
        /// # Errors
        ///
        /// Returns [`HttpError`] if no response was received.
        fn get(
            &self,
            url: &str,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + '_>>;
    }
}
