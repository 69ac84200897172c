//! # Tasklist Client
//!
//! Client-side cache layer for the tasklist API, with optimistic
//! mutations.
//!
//! The cache mirrors two server queries - the todos list and per-id
//! details - and must never be treated as authoritative while a mutation
//! is in flight. Every mutation follows the same protocol: cancel
//! conflicting refreshes, snapshot, publish the predicted result, call the
//! API, then commit or roll back and invalidate.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tasklist_client::{HttpTodoApi, TodoClient};
//! use tasklist_store::SystemClock;
//!
//! # async fn example() -> Result<(), tasklist_client::ClientError> {
//! let client = TodoClient::new(
//!     Arc::new(HttpTodoApi::new("http://localhost:3000")),
//!     Arc::new(SystemClock),
//! );
//!
//! let todo = client.create("Buy milk").await?;
//! client.delete(&todo.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod client;
pub mod mutation;

// Re-export commonly used types
pub use api::{ClientError, HttpTodoApi, TodoApi};
pub use cache::{CacheConfig, CacheEntry, CacheRead, QueryCache};
pub use client::TodoClient;
pub use mutation::{Mutation, MutationPhase, QueryKey};
