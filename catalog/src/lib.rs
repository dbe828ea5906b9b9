//! # Catalog
//!
//! Five small scenarios showing reactive state patterns built from the
//! State Kit units:
//!
//! | Scenario | Units |
//! |----------|-------|
//! | `basic` | one [`Slot`](state_kit_hooks::Slot) |
//! | `custom-hook` | one [`Counter`](state_kit_hooks::Counter) |
//! | `storage` | three persisted slots combined into one store |
//! | `fetch` | two independent [`AsyncResource`](state_kit_hooks::AsyncResource)s |
//! | `combined` | a counter and a persisted value kept in step |
//!
//! Each scenario owns its own units; nothing is shared between scenarios
//! except the durable store and the HTTP client handed in through
//! [`ScenarioContext`].

pub mod config;
pub mod scenarios;

pub use config::{CatalogConfig, ConfigError};
pub use scenarios::{Scenario, ScenarioContext};
