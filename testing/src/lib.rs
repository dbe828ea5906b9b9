//! # State Kit Testing
//!
//! Testing utilities and helpers for State Kit.
//!
//! This crate provides:
//! - Mock implementations of Environment traits ([`MockHttpClient`], [`FailingStorage`])
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for effects
//!
//! ## Example
//!
//! ```ignore
//! use state_kit_testing::MockHttpClient;
//!
//! #[tokio::test]
//! async fn test_users_load() {
//!     let http = MockHttpClient::new().with_json("https://api.test/users", r#"[{"id":1}]"#);
//!     let env = FetchEnvironment::new(Arc::new(http));
//!     let users = AsyncResource::<Vec<User>>::create("https://api.test/users", env).await?;
//!
//!     let state = users.settled(Duration::from_secs(1)).await?;
//!     assert_eq!(state.data.map(|u| u.len()), Some(1));
//! }
//! ```

pub mod mocks;

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Safe to call from every test; only the first call installs it.
    /// Honors `RUST_LOG`, defaulting to `debug`.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FailingStorage, MockHttpClient, ReplyGate};
pub use reducer_test::{assertions, ReducerTest};
