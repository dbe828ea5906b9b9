//! Persisted state: three independently keyed values in one store
//!
//! Each value has its own [`PersistedReducer`] scoped onto its field; the
//! scoped reducers are combined into [`StorageReducer`].

use super::ScenarioContext;
use serde::{Deserialize, Serialize};
use state_kit_core::composition::{combine_reducers, scope_reducer, CombinedReducer};
use state_kit_core::environment::KeyValueStore;
use state_kit_core::{effect::Effect, reducer::Reducer, SmallVec};
use state_kit_hooks::{
    PersistedAction, PersistedReducer, PersistedState, PersistenceEnvironment, Update,
};
use state_kit_runtime::{Store, StoreError};
use std::sync::Arc;

/// Storage key of the persisted counter
pub const COUNTER_KEY: &str = "counter-demo";
/// Storage key of the persisted name
pub const NAME_KEY: &str = "user-name";
/// Storage key of the persisted settings
pub const SETTINGS_KEY: &str = "app-settings";

/// Color theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background
    #[default]
    Light,
    /// Dark background
    Dark,
}

/// Application settings, persisted as one JSON object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Color theme
    pub theme: Theme,
    /// Whether notifications are enabled
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            notifications: true,
        }
    }
}

/// The three persisted values
#[derive(Debug, Clone, PartialEq)]
pub struct StorageState {
    /// Persisted counter
    pub counter: PersistedState<i64>,
    /// Persisted name
    pub name: PersistedState<String>,
    /// Persisted settings
    pub settings: PersistedState<Settings>,
}

impl StorageState {
    /// Read all three values from `storage`
    #[must_use]
    pub fn load(storage: &dyn KeyValueStore) -> Self {
        Self {
            counter: PersistedState::load(COUNTER_KEY, 0, storage),
            name: PersistedState::load(NAME_KEY, String::new(), storage),
            settings: PersistedState::load(SETTINGS_KEY, Settings::default(), storage),
        }
    }
}

/// Actions routed to one of the persisted values
#[derive(Debug, Clone)]
pub enum StorageAction {
    /// Update the counter
    Counter(PersistedAction<i64>),
    /// Update the name
    Name(PersistedAction<String>),
    /// Update the settings
    Settings(PersistedAction<Settings>),
}

fn counter_field(state: &mut StorageState) -> &mut PersistedState<i64> {
    &mut state.counter
}

fn name_field(state: &mut StorageState) -> &mut PersistedState<String> {
    &mut state.name
}

fn settings_field(state: &mut StorageState) -> &mut PersistedState<Settings> {
    &mut state.settings
}

fn counter_action(action: StorageAction) -> Option<PersistedAction<i64>> {
    match action {
        StorageAction::Counter(action) => Some(action),
        _ => None,
    }
}

fn name_action(action: StorageAction) -> Option<PersistedAction<String>> {
    match action {
        StorageAction::Name(action) => Some(action),
        _ => None,
    }
}

fn settings_action(action: StorageAction) -> Option<PersistedAction<Settings>> {
    match action {
        StorageAction::Settings(action) => Some(action),
        _ => None,
    }
}

/// The three scoped persisted reducers, combined
#[derive(Clone)]
pub struct StorageReducer {
    inner: Arc<CombinedReducer<StorageState, StorageAction, PersistenceEnvironment>>,
}

impl StorageReducer {
    /// Scope one persisted reducer per field and combine them
    #[must_use]
    pub fn new() -> Self {
        let inner = combine_reducers(vec![
            Box::new(scope_reducer(
                PersistedReducer::new(),
                counter_field,
                counter_action,
                StorageAction::Counter,
            )),
            Box::new(scope_reducer(
                PersistedReducer::new(),
                name_field,
                name_action,
                StorageAction::Name,
            )),
            Box::new(scope_reducer(
                PersistedReducer::new(),
                settings_field,
                settings_action,
                StorageAction::Settings,
            )),
        ]);

        Self {
            inner: Arc::new(inner),
        }
    }
}

impl Default for StorageReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for StorageReducer {
    type State = StorageState;
    type Action = StorageAction;
    type Environment = PersistenceEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.inner.reduce(state, action, env)
    }
}

/// Handle to the storage scenario's store
#[derive(Clone)]
pub struct PersistedForm {
    store: Store<StorageState, StorageAction, PersistenceEnvironment, StorageReducer>,
}

impl PersistedForm {
    /// Load the three values from `storage`
    #[must_use]
    pub fn create(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = StorageState::load(storage.as_ref());

        Self {
            store: Store::new(state, StorageReducer::new(), PersistenceEnvironment::new(storage)),
        }
    }

    /// Add `delta` to the counter
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn add_to_counter(&self, delta: i64) -> Result<(), StoreError> {
        self.send(StorageAction::Counter(PersistedAction::Set(Update::with(
            move |n: &i64| n.saturating_add(delta),
        ))))
        .await
    }

    /// Set the counter back to zero
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn reset_counter(&self) -> Result<(), StoreError> {
        self.send(StorageAction::Counter(PersistedAction::Reset)).await
    }

    /// Replace the name
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn set_name(&self, name: impl Into<String>) -> Result<(), StoreError> {
        self.send(StorageAction::Name(PersistedAction::Set(Update::Replace(name.into()))))
            .await
    }

    /// Clear the name
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn clear_name(&self) -> Result<(), StoreError> {
        self.send(StorageAction::Name(PersistedAction::Reset)).await
    }

    /// Change the theme, keeping the other settings
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.send(StorageAction::Settings(PersistedAction::Set(Update::with(
            move |s: &Settings| Settings {
                theme,
                ..s.clone()
            },
        ))))
        .await
    }

    /// Turn notifications on or off, keeping the other settings
    ///
    /// # Errors
    ///
    /// Fails only after the store has shut down.
    pub async fn set_notifications(&self, enabled: bool) -> Result<(), StoreError> {
        self.send(StorageAction::Settings(PersistedAction::Set(Update::with(
            move |s: &Settings| Settings {
                notifications: enabled,
                ..s.clone()
            },
        ))))
        .await
    }

    /// Current counter, name and settings
    pub async fn snapshot(&self) -> (i64, String, Settings) {
        self.store
            .state(|s| {
                (
                    *s.counter.value(),
                    s.name.value().clone(),
                    s.settings.value().clone(),
                )
            })
            .await
    }

    async fn send(&self, action: StorageAction) -> Result<(), StoreError> {
        self.store.send(action).await
    }
}

pub(crate) async fn demo(ctx: &ScenarioContext) -> Result<Vec<String>, StoreError> {
    let form = PersistedForm::create(Arc::clone(&ctx.storage));
    let (count, name, settings) = form.snapshot().await;
    let mut lines = vec![format!(
        "loaded: counter={count} name={name:?} theme={:?} notifications={}",
        settings.theme, settings.notifications
    )];

    form.add_to_counter(1).await?;
    form.set_name("Ada").await?;
    let theme = match settings.theme {
        Theme::Light => Theme::Dark,
        Theme::Dark => Theme::Light,
    };
    form.set_theme(theme).await?;
    form.set_notifications(!settings.notifications).await?;

    let (count, name, settings) = form.snapshot().await;
    lines.push(format!(
        "saved: counter={count} name={name:?} theme={:?} notifications={}",
        settings.theme, settings.notifications
    ));
    lines.push("run again to see the values reloaded".to_string());

    Ok(lines)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use state_kit_storage::MemoryStorage;

    #[test]
    fn test_settings_wire_format() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(json, r#"{"theme":"light","notifications":true}"#);
    }

    #[test]
    fn test_actions_reach_only_their_field() {
        let storage = Arc::new(MemoryStorage::new());
        let env = PersistenceEnvironment::new(storage.clone());
        let reducer = StorageReducer::new();
        let mut state = StorageState::load(storage.as_ref());

        let _ = reducer.reduce(
            &mut state,
            StorageAction::Name(PersistedAction::Set(Update::Replace("Lin".to_string()))),
            &env,
        );

        assert_eq!(state.name.value(), "Lin");
        assert_eq!(*state.counter.value(), 0);
        assert_eq!(storage.get(NAME_KEY).unwrap().as_deref(), Some(r#""Lin""#));
        assert_eq!(storage.get(COUNTER_KEY).unwrap(), None);
        assert_eq!(storage.get(SETTINGS_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_settings_updates_keep_other_fields() {
        let storage = Arc::new(MemoryStorage::new());
        let form = PersistedForm::create(storage.clone());

        form.set_theme(Theme::Dark).await.unwrap();
        form.set_notifications(false).await.unwrap();

        let (_, _, settings) = form.snapshot().await;
        assert_eq!(
            settings,
            Settings {
                theme: Theme::Dark,
                notifications: false,
            }
        );
        assert_eq!(
            storage.get(SETTINGS_KEY).unwrap().as_deref(),
            Some(r#"{"theme":"dark","notifications":false}"#)
        );
    }

    #[tokio::test]
    async fn test_values_reload_in_a_new_form() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStorage::new());

        let form = PersistedForm::create(Arc::clone(&storage));
        form.add_to_counter(2).await.unwrap();
        form.add_to_counter(-5).await.unwrap();
        form.set_name("Ada").await.unwrap();

        let reloaded = PersistedForm::create(storage);
        let (count, name, _) = reloaded.snapshot().await;
        assert_eq!(count, -3);
        assert_eq!(name, "Ada");

        reloaded.clear_name().await.unwrap();
        reloaded.reset_counter().await.unwrap();
        assert_eq!(reloaded.snapshot().await.0, 0);
        assert_eq!(reloaded.snapshot().await.1, "");
    }
}
