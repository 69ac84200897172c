//! Application state for Axum handlers.

use std::sync::Arc;
use tasklist_store::TodoStore;
use tokio::sync::RwLock;

/// Application state shared across all HTTP handlers.
///
/// Owns the store behind an async `RwLock`; handlers take a read or write
/// guard per request. The store itself is constructed by the process entry
/// point and injected here, never reached through a global.
#[derive(Clone)]
pub struct AppState {
    /// The authoritative todo store.
    pub store: Arc<RwLock<TodoStore>>,
}

impl AppState {
    /// Wraps an explicitly constructed store.
    #[must_use]
    pub fn new(store: TodoStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use tasklist_store::clock::SystemClock;
    use tasklist_store::id::TimeRandomIds;
    use tasklist_store::persistence::MemorySnapshot;

    #[test]
    fn state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[tokio::test]
    async fn clones_share_the_same_store() {
        let state = AppState::new(TodoStore::open(
            Box::new(MemorySnapshot::default()),
            StdArc::new(SystemClock),
            Box::new(TimeRandomIds),
        ));
        let sibling = state.clone();

        state.store.write().await.create("shared");
        assert_eq!(sibling.store.read().await.len(), 1);
    }
}
