//! Persisted state
//!
//! A [`ReactiveSlot`] mirrored to a durable key-value store under a fixed
//! key. Values are stored as JSON text.
//!
//! - **Read on init**: [`PersistedState::load`] reads the key once. A miss,
//!   an unreadable store, or text that does not decode falls back to the
//!   default. The store is not written until the first update.
//! - **Write on update**: every [`PersistedAction`] commits the new value in
//!   memory, then writes it through. A failed write is logged and counted
//!   but never rolls back the in-memory value.
//!
//! Two instances sharing a key do not coordinate; the last write wins.
//!
//! The write runs inside the reduction, under the store's write lock, so
//! writes reach the store in commit order and the stored text always matches
//! the last committed value. With a file-backed store the write is blocking
//! I/O on the async worker that holds the lock; keep persisted values small.

use crate::slot::ReactiveSlot;
use crate::update::Update;
use serde::de::DeserializeOwned;
use serde::Serialize;
use state_kit_core::environment::KeyValueStore;
use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use state_kit_runtime::{Store, StoreError};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// State of one persisted value
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState<T> {
    key: String,
    default: T,
    slot: ReactiveSlot<T>,
}

impl<T> PersistedState<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Read `key` from `storage`, falling back to `default`
    ///
    /// Never fails: read and decode failures are logged at `warn` and
    /// recovered with the default.
    pub fn load(key: impl Into<String>, default: T, storage: &dyn KeyValueStore) -> Self {
        let key = key.into();

        let value = match storage.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "Stored value does not decode, using default");
                    default.clone()
                },
            },
            Ok(None) => default.clone(),
            Err(error) => {
                tracing::warn!(key = %key, error = %error, "Failed to read stored value, using default");
                default.clone()
            },
        };

        Self {
            key,
            default,
            slot: ReactiveSlot::new(value),
        }
    }
}

impl<T> PersistedState<T> {
    /// Storage key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current in-memory value
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.slot.value
    }

    /// Value used when the store had nothing usable, and restored by `Reset`
    #[must_use]
    pub const fn default_value(&self) -> &T {
        &self.default
    }
}

/// Persisted state actions
#[derive(Debug, Clone)]
pub enum PersistedAction<T> {
    /// Replace or derive the value, then write it through
    Set(Update<T>),
    /// Restore the default, then write it through
    Reset,
}

/// Environment for [`PersistedReducer`]
#[derive(Clone)]
pub struct PersistenceEnvironment {
    /// Durable store the values are written to
    pub storage: Arc<dyn KeyValueStore>,
}

impl PersistenceEnvironment {
    /// Create an environment writing to `storage`
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }
}

/// Reducer for [`PersistedState`]
#[derive(Debug)]
pub struct PersistedReducer<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> PersistedReducer<T> {
    /// Create a new persisted state reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for PersistedReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PersistedReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// Write `value` to `storage` under `key`, reporting failures on the side
fn write_through<T: Serialize>(key: &str, value: &T, storage: &dyn KeyValueStore) {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(error) => {
            tracing::error!(key = %key, error = %error, "Failed to serialize value for storage");
            metrics::counter!("persisted.write.failed", "reason" => "serialize").increment(1);
            return;
        },
    };

    match storage.set(key, &text) {
        Ok(()) => tracing::debug!(key = %key, bytes = text.len(), "Persisted value"),
        Err(error) => {
            tracing::error!(key = %key, error = %error, "Failed to write value to storage");
            metrics::counter!("persisted.write.failed", "reason" => "store").increment(1);
        },
    }
}

impl<T> Reducer for PersistedReducer<T>
where
    T: Serialize + Clone,
{
    type State = PersistedState<T>;
    type Action = PersistedAction<T>;
    type Environment = PersistenceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let update = match action {
            PersistedAction::Set(update) => update,
            PersistedAction::Reset => Update::Replace(state.default.clone()),
        };

        let committed = state.slot.apply(update);
        write_through(&state.key, committed, env.storage.as_ref());

        smallvec![Effect::None]
    }
}

/// Handle to a persisted value running in its own store
pub struct Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    store: Store<PersistedState<T>, PersistedAction<T>, PersistenceEnvironment, PersistedReducer<T>>,
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind `key` in `storage`, reading the current entry or using `default`
    #[must_use]
    pub fn create(key: impl Into<String>, default: T, storage: Arc<dyn KeyValueStore>) -> Self {
        let state = PersistedState::load(key, default, storage.as_ref());

        Self {
            store: Store::new(
                state,
                PersistedReducer::new(),
                PersistenceEnvironment::new(storage),
            ),
        }
    }

    /// Apply an update, write it through, and return the value it committed
    ///
    /// A failed write does not make this fail; see the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn set(&self, update: impl Into<Update<T>>) -> Result<T, StoreError> {
        self.dispatch(PersistedAction::Set(update.into())).await
    }

    /// Restore the default, write it through, and return it
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn reset(&self) -> Result<T, StoreError> {
        self.dispatch(PersistedAction::Reset).await
    }

    /// Current in-memory value
    pub async fn get(&self) -> T {
        self.store.state(|s| s.value().clone()).await
    }

    /// Storage key
    pub async fn key(&self) -> String {
        self.store.state(|s| s.key().to_string()).await
    }

    /// Stop accepting updates
    ///
    /// # Errors
    ///
    /// Never fails in practice: writes happen inside the reducer.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(&self, action: PersistedAction<T>) -> Result<T, StoreError> {
        self.store.send_and_read(action, |s| s.value().clone()).await
    }
}

impl<T> Clone for Persisted<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use proptest::prelude::*;
    use std::collections::HashMap;
    use state_kit_storage::MemoryStorage;
    use state_kit_testing::{FailingStorage, ReducerTest};

    fn memory() -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::new())
    }

    #[test]
    fn test_load_from_empty_store_uses_default_without_writing() {
        let storage = memory();

        let state = PersistedState::load("counter", 7_i64, storage.as_ref());

        assert_eq!(*state.value(), 7);
        assert_eq!(storage.get("counter").unwrap(), None);
    }

    #[test]
    fn test_load_falls_back_on_undecodable_entry() {
        let storage = memory();
        storage.set("counter", "not json").unwrap();

        let state = PersistedState::load("counter", 0_i64, storage.as_ref());

        assert_eq!(*state.value(), 0);
        // Left untouched until the first update
        assert_eq!(storage.get("counter").unwrap().as_deref(), Some("not json"));
    }

    #[test]
    fn test_load_falls_back_on_unreadable_store() {
        let state = PersistedState::load("counter", 3_i64, &FailingStorage::new());
        assert_eq!(*state.value(), 3);
    }

    #[test]
    fn test_set_writes_committed_value() {
        let storage = memory();
        let env = PersistenceEnvironment::new(storage.clone());

        ReducerTest::new(PersistedReducer::new())
            .with_env(env)
            .given_state(PersistedState::load("n", 1_i64, storage.as_ref()))
            .when_action(PersistedAction::Set(Update::with(|n: &i64| n * 10)))
            .then_state(|state| assert_eq!(*state.value(), 10))
            .run();

        assert_eq!(storage.get("n").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn test_reset_writes_default() {
        let storage = memory();
        storage.set("name", r#""Ada""#).unwrap();
        let reducer = PersistedReducer::new();
        let env = PersistenceEnvironment::new(storage.clone());
        let mut state = PersistedState::load("name", String::new(), storage.as_ref());
        assert_eq!(state.value(), "Ada");

        let _ = reducer.reduce(&mut state, PersistedAction::Reset, &env);

        assert_eq!(state.value(), "");
        assert_eq!(storage.get("name").unwrap().as_deref(), Some(r#""""#));
    }

    #[test]
    fn test_write_failure_keeps_in_memory_value() {
        let reducer = PersistedReducer::new();
        let env = PersistenceEnvironment::new(Arc::new(FailingStorage::new()));
        let mut state = PersistedState::load("n", 0_i64, env.storage.as_ref());

        let _ = reducer.reduce(&mut state, PersistedAction::Set(Update::Replace(5)), &env);

        assert_eq!(*state.value(), 5);
    }

    #[test]
    fn test_quota_exceeded_keeps_in_memory_value() {
        let storage = Arc::new(MemoryStorage::with_quota(4));
        let reducer = PersistedReducer::new();
        let env = PersistenceEnvironment::new(storage.clone());
        let mut state = PersistedState::load("k", String::new(), storage.as_ref());

        let _ = reducer.reduce(&mut state, PersistedAction::Set("far too long".to_string().into()), &env);

        assert_eq!(state.value(), "far too long");
        assert_eq!(storage.get("k").unwrap(), None);
    }

    fn recorded(f: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, f);
        handle.render()
    }

    #[test]
    fn test_store_write_failure_is_counted() {
        let env = PersistenceEnvironment::new(Arc::new(FailingStorage::new()));
        let mut state = PersistedState::load("n", 0_i64, env.storage.as_ref());

        let rendered = recorded(|| {
            let _ = PersistedReducer::new().reduce(&mut state, PersistedAction::Set(1.into()), &env);
            let _ = PersistedReducer::new().reduce(&mut state, PersistedAction::Reset, &env);
        });

        assert!(rendered.contains(r#"persisted_write_failed{reason="store"} 2"#), "{rendered}");
        assert!(!rendered.contains(r#"reason="serialize""#), "{rendered}");
    }

    #[test]
    fn test_unserializable_value_is_counted_and_kept() {
        let storage = memory();
        let env = PersistenceEnvironment::new(storage.clone());
        let mut state = PersistedState::load("grid", HashMap::<(i32, i32), i32>::new(), storage.as_ref());
        let grid = HashMap::from([((0, 0), 1)]);

        let rendered = recorded(|| {
            let _ = PersistedReducer::new().reduce(&mut state, PersistedAction::Set(grid.clone().into()), &env);
        });

        assert!(rendered.contains(r#"persisted_write_failed{reason="serialize"} 1"#), "{rendered}");
        assert_eq!(state.value(), &grid);
        assert_eq!(storage.get("grid").unwrap(), None);
    }

    #[test]
    fn test_successful_write_is_not_counted() {
        let storage = memory();
        let env = PersistenceEnvironment::new(storage.clone());
        let mut state = PersistedState::load("n", 0_i64, storage.as_ref());

        let rendered = recorded(|| {
            let _ = PersistedReducer::new().reduce(&mut state, PersistedAction::Set(2.into()), &env);
        });

        assert!(!rendered.contains("persisted_write_failed"), "{rendered}");
    }

    proptest! {
        #[test]
        fn prop_empty_store_yields_default(key in "[a-z-]{1,16}", default in any::<i64>()) {
            let storage = MemoryStorage::new();

            let state = PersistedState::load(key.clone(), default, &storage);

            prop_assert_eq!(*state.value(), default);
            prop_assert_eq!(storage.get(&key).unwrap(), None);
        }

        #[test]
        fn prop_round_trip(key in "[a-z-]{1,16}", value in any::<(i64, String, bool)>(), other in any::<(i64, String, bool)>()) {
            let storage = memory();
            let env = PersistenceEnvironment::new(storage.clone());
            let reducer = PersistedReducer::new();
            let mut state = PersistedState::load(key.clone(), other.clone(), storage.as_ref());

            let _ = reducer.reduce(&mut state, PersistedAction::Set(Update::Replace(value.clone())), &env);
            let fresh = PersistedState::load(key, other, storage.as_ref());

            prop_assert_eq!(fresh.value(), &value);
        }

        #[test]
        fn prop_derived_sets_compose(initial in -1_000_000i64..1_000_000) {
            let storage = memory();
            let state = ReducerTest::new(PersistedReducer::new())
                .with_env(PersistenceEnvironment::new(storage.clone()))
                .given_state(PersistedState::load("n", initial, storage.as_ref()))
                .when_actions((0..3).map(|_| PersistedAction::Set(Update::with(|n: &i64| n + 1))))
                .run();

            prop_assert_eq!(*state.value(), initial + 3);
            let stored = (initial + 3).to_string();
            let loaded = storage.get("n").unwrap();
            prop_assert_eq!(loaded.as_deref(), Some(stored.as_str()));
        }
    }

    #[tokio::test]
    async fn test_handle_round_trip() {
        let storage: Arc<dyn KeyValueStore> = memory();

        let first = Persisted::create("user-name", String::new(), Arc::clone(&storage));
        first.set("Grace".to_string()).await.unwrap();

        let second = Persisted::create("user-name", "fallback".to_string(), storage);
        assert_eq!(second.get().await, "Grace");
        assert_eq!(second.key().await, "user-name");
    }
}
