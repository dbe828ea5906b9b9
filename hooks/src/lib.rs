//! # State Kit Hooks
//!
//! Small, reusable units of reactive state. Each unit is an explicit state
//! machine (state struct, action enum, reducer) plus a cloneable handle
//! that owns a [`Store`](state_kit_runtime::Store) running it.
//!
//! | Unit | Reducer | Handle |
//! |------|---------|--------|
//! | [`ReactiveSlot`] | [`SlotReducer`] | [`Slot`] |
//! | [`PersistedState`] | [`PersistedReducer`] | [`Persisted`] |
//! | [`ResourceState`] | [`ResourceReducer`] | [`AsyncResource`] |
//! | [`CounterState`] | [`CounterReducer`] | [`Counter`] |
//!
//! Reducers commit the next state in place. Anything composing two units
//! reads the committed value back from the state it just reduced, never
//! from a copy taken before the update.
//!
//! ## Example
//!
//! ```
//! use state_kit_hooks::{Counter, Update, Slot};
//!
//! # tokio_test::block_on(async {
//! let counter = Counter::create(5);
//! counter.increment().await.unwrap();
//! counter.increment().await.unwrap();
//! assert_eq!(counter.reset().await.unwrap(), 5);
//!
//! let name = Slot::create(String::new());
//! name.set("Ada".to_string()).await.unwrap();
//! let shout = name.set(Update::with(|n: &String| n.to_uppercase())).await.unwrap();
//! assert_eq!(shout, "ADA");
//! # });
//! ```

pub mod counter;
pub mod persisted;
pub mod resource;
pub mod slot;
pub mod update;

pub use counter::{Counter, CounterAction, CounterReducer, CounterState};
pub use persisted::{
    Persisted, PersistedAction, PersistedReducer, PersistedState, PersistenceEnvironment,
};
pub use resource::{
    fetch_json, AsyncResource, FetchEnvironment, FetchError, ResourceAction, ResourceReducer,
    ResourceState,
};
pub use slot::{ReactiveSlot, Slot, SlotAction, SlotReducer};
pub use update::Update;
