//! Basic state: a counter held in a single slot, not persisted

use state_kit_hooks::{Slot, Update};
use state_kit_runtime::StoreError;

/// Counter backed by a plain [`Slot`]
#[derive(Clone)]
pub struct BasicCounter {
    count: Slot<i64>,
}

impl BasicCounter {
    /// Start at zero
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: Slot::create(0),
        }
    }

    /// Add one
    ///
    /// # Errors
    ///
    /// Fails only after the slot has shut down.
    pub async fn increment(&self) -> Result<i64, StoreError> {
        self.count.set(Update::with(|n: &i64| n.saturating_add(1))).await
    }

    /// Subtract one
    ///
    /// # Errors
    ///
    /// Fails only after the slot has shut down.
    pub async fn decrement(&self) -> Result<i64, StoreError> {
        self.count.set(Update::with(|n: &i64| n.saturating_sub(1))).await
    }

    /// Back to zero
    ///
    /// # Errors
    ///
    /// Fails only after the slot has shut down.
    pub async fn reset(&self) -> Result<i64, StoreError> {
        self.count.set(0).await
    }

    /// Current count
    pub async fn value(&self) -> i64 {
        self.count.get().await
    }
}

impl Default for BasicCounter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) async fn demo() -> Result<Vec<String>, StoreError> {
    let counter = BasicCounter::new();
    let mut lines = vec![format!("count: {}", counter.value().await)];

    for _ in 0..3 {
        lines.push(format!("increment -> {}", counter.increment().await?));
    }
    lines.push(format!("decrement -> {}", counter.decrement().await?));
    lines.push(format!("reset -> {}", counter.reset().await?));

    Ok(lines)
}
