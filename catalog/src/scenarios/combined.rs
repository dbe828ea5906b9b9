//! Counter logic kept in step with a persisted value
//!
//! The counter and the persisted value are two independent units. Keeping
//! them in step has one trap: a caller that schedules `increment` and then
//! persists the counter value it read *before* the increment stores a
//! stale number.
//!
//! [`CombinedReducer`] avoids it by precomputing the next value from the
//! committed counter state, then fanning that one value out to both units.
//! The raw child actions ([`CombinedAction::Counter`] and
//! [`CombinedAction::Stored`]) stay routable so the unsafe ordering can be
//! reproduced.

use super::ScenarioContext;
use state_kit_core::environment::KeyValueStore;
use state_kit_core::{effect::Effect, reducer::Reducer, SmallVec};
use state_kit_hooks::{
    CounterAction, CounterReducer, CounterState, PersistedAction, PersistedReducer,
    PersistedState, PersistenceEnvironment, Update,
};
use state_kit_runtime::{Store, StoreError};
use std::sync::Arc;

/// Storage key of the persisted counter
pub const COMBINED_KEY: &str = "combined-counter";

/// Counter plus its persisted mirror
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedState {
    /// Transient counter logic
    pub counter: CounterState,
    /// Persisted mirror of the counter
    pub stored: PersistedState<i64>,
}

impl CombinedState {
    /// Read the persisted value and start the counter from it
    #[must_use]
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        let stored = PersistedState::load(COMBINED_KEY, 0, storage);
        let counter = CounterState::new(*stored.value());

        Self { counter, stored }
    }
}

/// Combined scenario actions
#[derive(Debug, Clone)]
pub enum CombinedAction {
    /// Increment and persist the incremented value
    Increment,
    /// Decrement and persist the decremented value
    Decrement,
    /// Reset the counter and persist the value it was reset to
    Reset,
    /// Raw counter action, not mirrored to storage
    Counter(CounterAction),
    /// Raw persisted-value action, not mirrored to the counter
    Stored(PersistedAction<i64>),
}

/// Reducer keeping the counter and its persisted mirror in step
#[derive(Debug, Clone, Default)]
pub struct CombinedReducer {
    counter: CounterReducer,
    stored: PersistedReducer<i64>,
}

impl CombinedReducer {
    /// Create a new combined reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            counter: CounterReducer::new(),
            stored: PersistedReducer::new(),
        }
    }

    /// Compute `next` once, then hand that same value to both units
    fn fan_out(
        &self,
        state: &mut CombinedState,
        counter_action: CounterAction,
        next: i64,
        env: &PersistenceEnvironment,
    ) -> SmallVec<[Effect<CombinedAction>; 4]> {
        let mut effects: SmallVec<[Effect<CombinedAction>; 4]> = self
            .counter
            .reduce(&mut state.counter, counter_action, &())
            .into_iter()
            .map(|e| e.map(CombinedAction::Counter))
            .collect();

        debug_assert_eq!(state.counter.value, next);

        effects.extend(
            self.stored
                .reduce(&mut state.stored, PersistedAction::Set(Update::Replace(next)), env)
                .into_iter()
                .map(|e| e.map(CombinedAction::Stored)),
        );

        tracing::debug!(value = next, "Counter and stored value updated together");
        effects
    }
}

impl Reducer for CombinedReducer {
    type State = CombinedState;
    type Action = CombinedAction;
    type Environment = PersistenceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CombinedAction::Increment => {
                let next = state.counter.value.saturating_add(1);
                self.fan_out(state, CounterAction::Increment, next, env)
            },
            CombinedAction::Decrement => {
                let next = state.counter.value.saturating_sub(1);
                self.fan_out(state, CounterAction::Decrement, next, env)
            },
            CombinedAction::Reset => {
                let next = state.counter.initial;
                self.fan_out(state, CounterAction::Reset, next, env)
            },
            CombinedAction::Counter(action) => self
                .counter
                .reduce(&mut state.counter, action, &())
                .into_iter()
                .map(|e| e.map(CombinedAction::Counter))
                .collect(),
            CombinedAction::Stored(action) => self
                .stored
                .reduce(&mut state.stored, action, env)
                .into_iter()
                .map(|e| e.map(CombinedAction::Stored))
                .collect(),
        }
    }
}

/// Handle to the combined scenario's store
#[derive(Clone)]
pub struct SyncedCounter {
    store: Store<CombinedState, CombinedAction, PersistenceEnvironment, CombinedReducer>,
}

impl SyncedCounter {
    /// Load the persisted value and start the counter from it
    #[must_use]
    pub fn create(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = CombinedState::load(storage.as_ref());

        Self {
            store: Store::new(state, CombinedReducer::new(), PersistenceEnvironment::new(storage)),
        }
    }

    /// Send any combined action
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn send(&self, action: CombinedAction) -> Result<(), StoreError> {
        self.store.send(action).await
    }

    /// Increment both views
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn increment(&self) -> Result<(), StoreError> {
        self.send(CombinedAction::Increment).await
    }

    /// Decrement both views
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn decrement(&self) -> Result<(), StoreError> {
        self.send(CombinedAction::Decrement).await
    }

    /// Reset both views
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.send(CombinedAction::Reset).await
    }

    /// Counter value and in-memory stored value
    pub async fn values(&self) -> (i64, i64) {
        self.store
            .state(|s| (s.counter.value, *s.stored.value()))
            .await
    }
}

pub(crate) async fn demo(ctx: &ScenarioContext) -> Result<Vec<String>, StoreError> {
    let synced = SyncedCounter::create(Arc::clone(&ctx.storage));
    let report = |label: &str, (counter, stored): (i64, i64)| {
        format!("{label}: counter={counter} stored={stored}")
    };

    let mut lines = vec![report("loaded", synced.values().await)];

    synced.increment().await?;
    lines.push(report("increment", synced.values().await));
    synced.increment().await?;
    lines.push(report("increment", synced.values().await));
    synced.decrement().await?;
    lines.push(report("decrement", synced.values().await));
    synced.reset().await?;
    lines.push(report("reset", synced.values().await));

    Ok(lines)
}
