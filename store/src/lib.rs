//! # Tasklist Store
//!
//! The authoritative in-process holder of todo records.
//!
//! This crate owns the domain model (`Todo`, `UpdateTodo`) and the
//! [`TodoStore`], a single-writer collection that persists a whole-array
//! snapshot after every successful mutation. External concerns are injected
//! behind traits so everything stays testable:
//!
//! - [`Clock`](clock::Clock) abstracts time (fixed/step clocks in tests)
//! - [`IdGenerator`](id::IdGenerator) abstracts id assignment
//! - [`Snapshot`](persistence::Snapshot) abstracts the persisted snapshot
//!
//! # Example
//!
//! ```
//! use tasklist_store::clock::SystemClock;
//! use tasklist_store::id::TimeRandomIds;
//! use tasklist_store::persistence::MemorySnapshot;
//! use tasklist_store::{TodoStore, UpdateTodo};
//! use std::sync::Arc;
//!
//! let mut store = TodoStore::open(
//!     Box::new(MemorySnapshot::default()),
//!     Arc::new(SystemClock),
//!     Box::new(TimeRandomIds),
//! );
//!
//! let todo = store.create("Buy milk");
//! store.update(&todo.id, UpdateTodo::completed(true));
//! assert_eq!(store.clear_completed(), 1);
//! ```

pub mod clock;
pub mod id;
pub mod persistence;
pub mod store;
pub mod todo;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use id::{IdGenerator, TimeRandomIds};
pub use persistence::{JsonFileSnapshot, MemorySnapshot, Snapshot, SnapshotError};
pub use store::TodoStore;
pub use todo::{Todo, UpdateTodo};
