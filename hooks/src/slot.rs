//! Reactive slot: a single current value with replace or derive updates

use crate::update::Update;
use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
use state_kit_runtime::{Store, StoreError};
use std::marker::PhantomData;

/// Holder of one current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactiveSlot<T> {
    /// Current committed value
    pub value: T,
}

impl<T> ReactiveSlot<T> {
    /// Create a slot holding `value`
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Commit `update` and return the committed value
    pub fn apply(&mut self, update: Update<T>) -> &T {
        self.value = update.resolve(&self.value);
        &self.value
    }
}

/// Slot actions
#[derive(Debug, Clone)]
pub enum SlotAction<T> {
    /// Replace or derive the value
    Set(Update<T>),
}

/// Reducer for [`ReactiveSlot`]
#[derive(Debug)]
pub struct SlotReducer<T> {
    _phantom: PhantomData<fn() -> T>,
}

impl<T> SlotReducer<T> {
    /// Create a new slot reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T> Default for SlotReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for SlotReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Reducer for SlotReducer<T> {
    type State = ReactiveSlot<T>;
    type Action = SlotAction<T>;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SlotAction::Set(update) => {
                state.apply(update);
            },
        }

        smallvec![Effect::None]
    }
}

/// Handle to a [`ReactiveSlot`] running in its own store
///
/// Clones share the same slot.
pub struct Slot<T>
where
    T: Clone + Send + Sync + 'static,
{
    store: Store<ReactiveSlot<T>, SlotAction<T>, (), SlotReducer<T>>,
}

impl<T> Slot<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a slot holding `initial`
    #[must_use]
    pub fn create(initial: T) -> Self {
        Self {
            store: Store::new(ReactiveSlot::new(initial), SlotReducer::new(), ()),
        }
    }

    /// Apply an update and return the value it committed
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`shutdown`](Self::shutdown).
    pub async fn set(&self, update: impl Into<Update<T>>) -> Result<T, StoreError> {
        self.store
            .send_and_read(SlotAction::Set(update.into()), |slot| slot.value.clone())
            .await
    }

    /// Current value
    pub async fn get(&self) -> T {
        self.store.state(|slot| slot.value.clone()).await
    }

    /// Stop accepting updates
    ///
    /// # Errors
    ///
    /// Never fails in practice: slot updates run no effects.
    pub async fn shutdown(&self, timeout: std::time::Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl<T> Clone for Slot<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}
