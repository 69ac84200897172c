//! High-level client tying reads, optimistic mutations, and
//! reconciliation together.

use crate::api::{ClientError, TodoApi};
use crate::cache::{CacheConfig, CacheRead, QueryCache};
use crate::mutation::{Mutation, QueryKey};
use std::sync::Arc;
use tasklist_store::{Clock, Todo, UpdateTodo};
use tokio::sync::RwLock;

/// Client-side view of the todo API with an optimistic cache.
///
/// Reads serve cached values per the staleness policy; mutations publish
/// their predicted result immediately and reconcile when the API call
/// settles. The synchronous optimistic-apply and rollback sections each
/// run under the cache write lock, so no two of them interleave without a
/// suspension point in between.
pub struct TodoClient {
    api: Arc<dyn TodoApi>,
    cache: Arc<RwLock<QueryCache>>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl TodoClient {
    /// Client over the given API with the default staleness policy.
    #[must_use]
    pub fn new(api: Arc<dyn TodoApi>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(api, clock, CacheConfig::default())
    }

    /// Client with an explicit staleness/retention policy.
    #[must_use]
    pub fn with_config(api: Arc<dyn TodoApi>, clock: Arc<dyn Clock>, config: CacheConfig) -> Self {
        Self {
            api,
            cache: Arc::new(RwLock::new(QueryCache::new())),
            clock,
            config,
        }
    }

    // ---- reads ----

    /// All todos, served from cache per the staleness policy.
    ///
    /// A stale hit is returned immediately while a background refresh
    /// re-fetches; the refresh is discarded if a mutation supersedes it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only on a cache miss whose fetch fails.
    pub async fn todos(&self) -> Result<Vec<Todo>, ClientError> {
        let now = self.clock.now();
        let (read, epoch) = {
            let mut cache = self.cache.write().await;
            cache.evict_expired(now, &self.config);
            (cache.read_list(now, &self.config), cache.list_epoch())
        };
        match read {
            CacheRead::Fresh(todos) => Ok(todos),
            CacheRead::Stale(todos) => {
                self.spawn_list_refresh(epoch);
                Ok(todos)
            }
            CacheRead::Miss => {
                let todos = self.api.list().await?;
                self.cache
                    .write()
                    .await
                    .apply_list_refresh(epoch, todos.clone(), self.clock.now());
                Ok(todos)
            }
        }
    }

    /// One todo by id, served from cache per the staleness policy.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only on a cache miss whose fetch fails
    /// (including `NOT_FOUND` from the server).
    pub async fn todo(&self, id: &str) -> Result<Todo, ClientError> {
        let now = self.clock.now();
        let (read, epoch) = {
            let mut cache = self.cache.write().await;
            cache.evict_expired(now, &self.config);
            (
                cache.read_detail(id, now, &self.config),
                cache.detail_epoch(id),
            )
        };
        match read {
            CacheRead::Fresh(todo) => Ok(todo),
            CacheRead::Stale(todo) => {
                self.spawn_detail_refresh(id.to_string(), epoch);
                Ok(todo)
            }
            CacheRead::Miss => {
                let todo = self.api.get(id).await?;
                self.cache.write().await.apply_detail_refresh(
                    id,
                    epoch,
                    todo.clone(),
                    self.clock.now(),
                );
                Ok(todo)
            }
        }
    }

    // ---- mutations ----

    /// Create a todo.
    ///
    /// The list view immediately shows a provisional record under a
    /// temporary id; the post-commit refetch reconciles it with the real
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] after rolling the optimistic record back.
    pub async fn create(&self, title: &str) -> Result<Todo, ClientError> {
        let now = self.clock.now();
        let mutation = {
            let mut cache = self.cache.write().await;
            let mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
            let provisional = Todo::new(
                format!("temp_{}", now.timestamp_millis()),
                title.trim().to_string(),
                now,
            );
            cache.edit_list(now, |todos| todos.push(provisional));
            mutation
        };

        match self.api.create(title).await {
            Ok(todo) => {
                mutation.commit(&mut *self.cache.write().await);
                Ok(todo)
            }
            Err(err) => {
                mutation.roll_back(&mut *self.cache.write().await);
                Err(err)
            }
        }
    }

    /// Apply a partial update to a todo.
    ///
    /// Both the list view and the detail view (when cached) reflect the
    /// merged record immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] after rolling the optimistic merge back.
    pub async fn update(&self, id: &str, update: UpdateTodo) -> Result<Todo, ClientError> {
        let now = self.clock.now();
        let mutation = {
            let mut cache = self.cache.write().await;
            let mutation = Mutation::begin(
                &mut cache,
                vec![QueryKey::List, QueryKey::Detail(id.to_string())],
            );
            let merge = |todo: &mut Todo| {
                if let Some(title) = &update.title {
                    todo.title = title.trim().to_string();
                }
                if let Some(completed) = update.completed {
                    todo.completed = completed;
                }
                todo.updated_at = now;
            };
            cache.edit_list(now, |todos| {
                if let Some(todo) = todos.iter_mut().find(|todo| todo.id == id) {
                    merge(todo);
                }
            });
            cache.edit_detail(id, now, merge);
            mutation
        };

        match self.api.update(id, update).await {
            Ok(todo) => {
                mutation.commit(&mut *self.cache.write().await);
                Ok(todo)
            }
            Err(err) => {
                mutation.roll_back(&mut *self.cache.write().await);
                Err(err)
            }
        }
    }

    /// Delete a todo.
    ///
    /// The record disappears from the list view immediately; on success
    /// the detail key is dropped from the cache entirely.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] after restoring the optimistic removal.
    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let now = self.clock.now();
        let mutation = {
            let mut cache = self.cache.write().await;
            let mutation = Mutation::begin(
                &mut cache,
                vec![QueryKey::List, QueryKey::Detail(id.to_string())],
            );
            cache.edit_list(now, |todos| todos.retain(|todo| todo.id != id));
            mutation
        };

        match self.api.delete(id).await {
            Ok(()) => {
                let mut cache = self.cache.write().await;
                mutation.commit(&mut cache);
                cache.remove_detail(id);
                Ok(())
            }
            Err(err) => {
                mutation.roll_back(&mut *self.cache.write().await);
                Err(err)
            }
        }
    }

    /// Remove all completed todos.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] after restoring the optimistic sweep.
    pub async fn clear_completed(&self) -> Result<usize, ClientError> {
        let now = self.clock.now();
        let mutation = {
            let mut cache = self.cache.write().await;
            let mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
            cache.edit_list(now, |todos| todos.retain(|todo| !todo.completed));
            mutation
        };

        match self.api.clear_completed().await {
            Ok(removed) => {
                mutation.commit(&mut *self.cache.write().await);
                Ok(removed)
            }
            Err(err) => {
                mutation.roll_back(&mut *self.cache.write().await);
                Err(err)
            }
        }
    }

    // ---- maintenance ----

    /// Evict cache entries unused past the retention window.
    ///
    /// Reads already sweep opportunistically; this is for reclaiming
    /// memory during idle periods.
    pub async fn evict_expired(&self) {
        self.cache
            .write()
            .await
            .evict_expired(self.clock.now(), &self.config);
    }

    // Background refreshes carry the epoch observed at start; the cache
    // discards them when a mutation moved the epoch in the meantime.
    fn spawn_list_refresh(&self, epoch: u64) {
        let api = Arc::clone(&self.api);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            match api.list().await {
                Ok(todos) => {
                    cache.write().await.apply_list_refresh(epoch, todos, clock.now());
                }
                Err(err) => tracing::debug!(error = %err, "background list refresh failed"),
            }
        });
    }

    fn spawn_detail_refresh(&self, id: String, epoch: u64) {
        let api = Arc::clone(&self.api);
        let cache = Arc::clone(&self.cache);
        let clock = Arc::clone(&self.clock);
        tokio::spawn(async move {
            match api.get(&id).await {
                Ok(todo) => {
                    cache
                        .write()
                        .await
                        .apply_detail_refresh(&id, epoch, todo, clock.now());
                }
                Err(err) => {
                    tracing::debug!(id, error = %err, "background detail refresh failed");
                }
            }
        });
    }
}
