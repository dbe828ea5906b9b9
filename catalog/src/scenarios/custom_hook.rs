//! Custom hook: counter logic packaged as a reusable unit

use state_kit_hooks::Counter;
use state_kit_runtime::StoreError;

pub(crate) async fn demo() -> Result<Vec<String>, StoreError> {
    let counter = Counter::create(0);
    let mut lines = vec![format!("count: {}", counter.value().await)];

    // Every clone exposes the same operations
    let buttons = counter.clone();
    lines.push(format!("increment -> {}", buttons.increment().await?));
    lines.push(format!("increment -> {}", buttons.increment().await?));
    lines.push(format!("decrement -> {}", buttons.decrement().await?));
    lines.push(format!("reset -> {}", counter.reset().await?));

    Ok(lines)
}
