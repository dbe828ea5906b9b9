//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers in various ways:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a child reducer on one field of a parent state
//!
//! A typical parent owns several independent slots. Each slot's reducer is
//! scoped onto its field and the scoped reducers are combined:
//!
//! ```
//! use state_kit_core::composition::{combine_reducers, scope_reducer};
//! use state_kit_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Default)]
//! struct Tally {
//!     count: i32,
//! }
//!
//! #[derive(Clone)]
//! struct Add(i32);
//!
//! struct TallyReducer;
//!
//! impl Reducer for TallyReducer {
//!     type State = Tally;
//!     type Action = Add;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut Tally, action: Add, _env: &()) -> SmallVec<[Effect<Add>; 4]> {
//!         state.count += action.0;
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Board {
//!     home: Tally,
//!     away: Tally,
//! }
//!
//! #[derive(Clone)]
//! enum BoardAction {
//!     Home(Add),
//!     Away(Add),
//! }
//!
//! fn home(board: &mut Board) -> &mut Tally {
//!     &mut board.home
//! }
//!
//! fn away(board: &mut Board) -> &mut Tally {
//!     &mut board.away
//! }
//!
//! let board_reducer = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         TallyReducer,
//!         home,
//!         |a| match a {
//!             BoardAction::Home(add) => Some(add),
//!             BoardAction::Away(_) => None,
//!         },
//!         BoardAction::Home,
//!     )),
//!     Box::new(scope_reducer(
//!         TallyReducer,
//!         away,
//!         |a| match a {
//!             BoardAction::Away(add) => Some(add),
//!             BoardAction::Home(_) => None,
//!         },
//!         BoardAction::Away,
//!     )),
//! ]);
//!
//! let mut board = Board::default();
//! let _ = board_reducer.reduce(&mut board, BoardAction::Home(Add(2)), &());
//! let _ = board_reducer.reduce(&mut board, BoardAction::Away(Add(1)), &());
//! assert_eq!(board.home.count, 2);
//! assert_eq!(board.away.count, 1);
//! ```

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, and all effects are collected and concatenated.
///
/// # Type Parameters
///
/// - `S`: The state type
/// - `A`: The action type
/// - `E`: The environment type
#[must_use]
pub fn combine_reducers<S, A, E>(
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
) -> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    reducers: Vec<Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>>,
}

impl<S, A, E> CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    /// Number of reducers being combined
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether no reducers are combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    S: 'static,
    A: Clone + 'static,
    E: 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let mut all_effects = SmallVec::new();

        for reducer in &self.reducers {
            let effects = reducer.reduce(state, action.clone(), env);
            all_effects.extend(effects);
        }

        all_effects
    }
}

/// Scopes a reducer to operate on one field of a larger state.
///
/// - `lens` selects the child state inside the parent
/// - `extract` picks out the parent actions meant for the child (others are ignored)
/// - `embed` lifts actions fed back by the child's effects into the parent action type
///
/// # Type Parameters
///
/// - `S`: The parent state type
/// - `SubS`: The child state type
/// - `A`: The parent action type
/// - `SubA`: The child action type
/// - `E`: The environment type
pub fn scope_reducer<S, SubS, A, SubA, E, R>(
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
) -> ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    ScopedReducer {
        reducer,
        lens,
        extract,
        embed,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
{
    reducer: R,
    lens: fn(&mut S) -> &mut SubS,
    extract: fn(A) -> Option<SubA>,
    embed: fn(SubA) -> A,
    _phantom: std::marker::PhantomData<fn() -> E>,
}

impl<S, SubS, A, SubA, E, R> Reducer for ScopedReducer<S, SubS, A, SubA, E, R>
where
    R: Reducer<State = SubS, Action = SubA, Environment = E>,
    A: Send + 'static,
    SubA: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(sub_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let effects = self.reducer.reduce((self.lens)(state), sub_action, env);

        effects
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
