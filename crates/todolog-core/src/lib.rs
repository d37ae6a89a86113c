//! todolog core library
//!
//! An event-sourced to-do item store. Every change is an event appended to a
//! JSON log on disk; the current item set is whatever folding the log yields.
//!
//! # Architecture
//!
//! - **Store**: owns the log, serializes all writes through one task
//! - **Events**: the store's only output, historical and live alike
//! - **TodoList**: consumer-side projection folded from those events
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open(config.data_dir);
//! store.replayed().await;
//!
//! let mut todos = TodoList::new();
//! todos.apply_all(&store.events());
//!
//! store.add_item(Item::new("buy milk")).await;
//! store.persist();
//! store.close().await;
//! todos.apply_all(&store.events());
//! ```
//!
//! # Modules
//!
//! - `store`: the store handle and its control loop (main entry point)
//! - `event`: event types
//! - `models`: items and IDs
//! - `projection`: the in-memory item list
//! - `storage`: log codec and file handling
//! - `config`: application configuration

pub mod config;
pub mod event;
pub mod models;
pub mod projection;
pub mod storage;
pub mod store;

pub use config::Config;
pub use event::{Event, IoError, ItemAdded, ItemChanged, ItemRemoved};
pub use models::{Id, IdError, Item};
pub use projection::{Filter, ResolveError, TodoList};
pub use storage::{CodecError, StoreError};
pub use store::{Store, StoreOptions};
