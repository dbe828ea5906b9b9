//! Functional updates
//!
//! An [`Update`] either replaces a value outright or derives the next value
//! from the previous one. Derived updates compose: applying
//! `Update::with(|n| n + 1)` three times in a row adds three, because each
//! application sees the value the previous one committed.

use std::fmt;
use std::sync::Arc;

/// The next value for a piece of state
pub enum Update<T> {
    /// Replace the current value
    Replace(T),
    /// Compute the next value from the current one
    With(Arc<dyn Fn(&T) -> T + Send + Sync>),
}

impl<T> Update<T> {
    /// Build a derived update from a function of the previous value
    pub fn with<F>(f: F) -> Self
    where
        F: Fn(&T) -> T + Send + Sync + 'static,
    {
        Self::With(Arc::new(f))
    }

    /// Resolve to a concrete value given the previous one
    #[must_use]
    pub fn resolve(self, previous: &T) -> T {
        match self {
            Self::Replace(value) => value,
            Self::With(f) => f(previous),
        }
    }
}

impl<T: Clone> Clone for Update<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Replace(value) => Self::Replace(value.clone()),
            Self::With(f) => Self::With(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::With(_) => f.write_str("With(<fn>)"),
        }
    }
}

impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Self::Replace(value)
    }
}
