//! # State Kit Storage
//!
//! Durable key-value backends for persisted state.
//!
//! - [`MemoryStorage`]: process-local map with an optional byte quota
//! - [`FileStorage`]: a single JSON document on disk, rewritten atomically on
//!   every change
//!
//! Both implement [`KeyValueStore`](state_kit_core::environment::KeyValueStore),
//! so either can back a persisted slot.
//!
//! # Example
//!
//! ```
//! use state_kit_core::environment::KeyValueStore;
//! use state_kit_storage::MemoryStorage;
//!
//! let storage = MemoryStorage::new();
//! storage.set("theme", r#""dark""#).unwrap();
//! assert_eq!(storage.get("theme").unwrap().as_deref(), Some(r#""dark""#));
//! ```

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;
