//! Scenario selection and shared context

pub mod basic;
pub mod combined;
pub mod custom_hook;
pub mod fetch;
pub mod storage;

use crate::config::CatalogConfig;
use state_kit_core::environment::{HttpClient, KeyValueStore};
use state_kit_runtime::StoreError;
use std::sync::Arc;

/// One entry of the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scenario {
    /// A plain counter slot
    Basic,
    /// Counter logic packaged as a reusable unit
    CustomHook,
    /// Values persisted to the durable store
    Storage,
    /// Async retrieval with loading and error states
    Fetch,
    /// Counter logic kept in step with a persisted value
    Combined,
}

impl Scenario {
    /// Every scenario, in catalog order
    pub const ALL: [Self; 5] = [
        Self::Basic,
        Self::CustomHook,
        Self::Storage,
        Self::Fetch,
        Self::Combined,
    ];

    /// Heading shown above the scenario's output
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Basic => "Basic state",
            Self::CustomHook => "Custom hook: counter logic",
            Self::Storage => "Persisted state",
            Self::Fetch => "Async resources",
            Self::Combined => "Counter logic + persisted state",
        }
    }

    /// Run the scenario's demonstration and return the lines it reports
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if a store shuts down mid-run or a fetch
    /// cycle does not settle in time.
    pub async fn run(self, ctx: &ScenarioContext) -> Result<Vec<String>, StoreError> {
        tracing::info!(scenario = ?self, "Running scenario");

        match self {
            Self::Basic => basic::demo().await,
            Self::CustomHook => custom_hook::demo().await,
            Self::Storage => storage::demo(ctx).await,
            Self::Fetch => fetch::demo(ctx).await,
            Self::Combined => combined::demo(ctx).await,
        }
    }
}

/// External collaborators handed to every scenario
#[derive(Clone)]
pub struct ScenarioContext {
    /// Durable key-value store
    pub storage: Arc<dyn KeyValueStore>,
    /// Network retrieval collaborator
    pub http: Arc<dyn HttpClient>,
    /// Loaded configuration
    pub config: CatalogConfig,
}

impl ScenarioContext {
    /// Bundle the collaborators
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        http: Arc<dyn HttpClient>,
        config: CatalogConfig,
    ) -> Self {
        Self {
            storage,
            http,
            config,
        }
    }
}
