//! Counter logic
//!
//! A minimal counter with increment, decrement, and reset-to-initial.
//! The counter is a pure state machine: every action returns `Effect::None`.
//!
//! Increments and decrements are applied to the value the store holds when
//! the action is reduced, so several calls in a row each see the previous
//! call's result.

use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use state_kit_runtime::{Store, StoreError};
use std::time::Duration;

/// Counter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    /// Current count value
    pub value: i64,
    /// Value captured at creation, restored by [`CounterAction::Reset`]
    pub initial: i64,
}

impl CounterState {
    /// Create a counter starting at `initial`
    #[must_use]
    pub const fn new(initial: i64) -> Self {
        Self {
            value: initial,
            initial,
        }
    }
}

impl Default for CounterState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Counter actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    /// Increment the counter by 1
    Increment,
    /// Decrement the counter by 1
    Decrement,
    /// Restore the value captured at creation
    Reset,
}

/// Counter reducer
///
/// Arithmetic saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl CounterReducer {
    /// Create a new counter reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _environment: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::Increment => {
                state.value = state.value.saturating_add(1);
            },
            CounterAction::Decrement => {
                state.value = state.value.saturating_sub(1);
            },
            CounterAction::Reset => {
                state.value = state.initial;
            },
        }

        tracing::trace!(value = state.value, ?action, "Counter updated");

        smallvec![Effect::None]
    }
}

/// Handle to a counter running in its own store
///
/// The operations are methods on a cloneable handle, so every clone offers
/// the same `increment`, `decrement` and `reset`.
#[derive(Clone)]
pub struct Counter {
    store: Store<CounterState, CounterAction, (), CounterReducer>,
}

impl Counter {
    /// Create a counter starting at `initial`
    #[must_use]
    pub fn create(initial: i64) -> Self {
        Self {
            store: Store::new(CounterState::new(initial), CounterReducer::new(), ()),
        }
    }

    /// Add one and return the new value
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn increment(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Increment).await
    }

    /// Subtract one and return the new value
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn decrement(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Decrement).await
    }

    /// Restore the initial value and return it
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn reset(&self) -> Result<i64, StoreError> {
        self.dispatch(CounterAction::Reset).await
    }

    /// Current value
    pub async fn value(&self) -> i64 {
        self.store.state(|s| s.value).await
    }

    /// Value the counter was created with
    pub async fn initial(&self) -> i64 {
        self.store.state(|s| s.initial).await
    }

    /// Stop accepting operations
    ///
    /// # Errors
    ///
    /// Never fails in practice: counter operations run no effects.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }

    async fn dispatch(&self, action: CounterAction) -> Result<i64, StoreError> {
        self.store.send_and_read(action, |s| s.value).await
    }
}
