//! Query cache with stale-while-revalidate bookkeeping.
//!
//! Two cached views are tracked independently: the todos list and per-id
//! detail records. Each carries its fetch time, last-use time, and an
//! explicit stale flag; each key also has an epoch counter that in-flight
//! refreshes must match when they land, which is how a newer mutation
//! cancels an older refresh without holding onto task handles.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tasklist_store::Todo;

/// Freshness and retention windows for cached values.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    /// Reads younger than this serve the cached value with no network call.
    pub freshness: Duration,
    /// Entries unused longer than this are evicted entirely.
    pub retention: Duration,
}

impl Default for CacheConfig {
    /// 5 minute freshness, 15 minute retention.
    fn default() -> Self {
        Self {
            freshness: Duration::minutes(5),
            retention: Duration::minutes(15),
        }
    }
}

/// A cached value with its staleness bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// When the value was fetched (or optimistically published).
    pub fetched_at: DateTime<Utc>,
    /// When the value was last read.
    pub last_used: DateTime<Utc>,
    /// Explicitly invalidated, regardless of age.
    pub stale: bool,
}

impl<T> CacheEntry<T> {
    fn new(value: T, now: DateTime<Utc>) -> Self {
        Self {
            value,
            fetched_at: now,
            last_used: now,
            stale: false,
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>, freshness: Duration) -> bool {
        !self.stale && now - self.fetched_at <= freshness
    }

    fn renew(&mut self, now: DateTime<Utc>) {
        self.fetched_at = now;
        self.last_used = now;
        self.stale = false;
    }
}

/// Outcome of a cache read.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheRead<T> {
    /// Fresh hit: serve without a network call.
    Fresh(T),
    /// Stale hit: serve immediately, then refresh in the background.
    Stale(T),
    /// No cached value; the caller must fetch.
    Miss,
}

/// Client-side cache over the list and detail query keys.
#[derive(Debug, Default)]
pub struct QueryCache {
    list: Option<CacheEntry<Vec<Todo>>>,
    details: HashMap<String, CacheEntry<Todo>>,
    list_epoch: u64,
    detail_epochs: HashMap<String, u64>,
}

impl QueryCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ---- reads ----

    /// Read the list view, updating its last-use time.
    pub fn read_list(&mut self, now: DateTime<Utc>, config: &CacheConfig) -> CacheRead<Vec<Todo>> {
        match &mut self.list {
            Some(entry) => {
                entry.last_used = now;
                if entry.is_fresh(now, config.freshness) {
                    CacheRead::Fresh(entry.value.clone())
                } else {
                    CacheRead::Stale(entry.value.clone())
                }
            }
            None => CacheRead::Miss,
        }
    }

    /// Read a detail view, updating its last-use time.
    pub fn read_detail(
        &mut self,
        id: &str,
        now: DateTime<Utc>,
        config: &CacheConfig,
    ) -> CacheRead<Todo> {
        match self.details.get_mut(id) {
            Some(entry) => {
                entry.last_used = now;
                if entry.is_fresh(now, config.freshness) {
                    CacheRead::Fresh(entry.value.clone())
                } else {
                    CacheRead::Stale(entry.value.clone())
                }
            }
            None => CacheRead::Miss,
        }
    }

    // ---- authoritative writes ----

    /// Store a freshly fetched list value.
    pub fn store_list(&mut self, todos: Vec<Todo>, now: DateTime<Utc>) {
        self.list = Some(CacheEntry::new(todos, now));
    }

    /// Store a freshly fetched detail value.
    pub fn store_detail(&mut self, todo: Todo, now: DateTime<Utc>) {
        self.details.insert(todo.id.clone(), CacheEntry::new(todo, now));
    }

    // ---- refresh cancellation ----

    /// Epoch to tag a list refresh with before it starts.
    #[must_use]
    pub fn list_epoch(&self) -> u64 {
        self.list_epoch
    }

    /// Epoch to tag a detail refresh with before it starts.
    #[must_use]
    pub fn detail_epoch(&self, id: &str) -> u64 {
        self.detail_epochs.get(id).copied().unwrap_or(0)
    }

    /// Invalidate any in-flight list refresh.
    pub fn bump_list_epoch(&mut self) {
        self.list_epoch += 1;
    }

    /// Invalidate any in-flight detail refresh.
    pub fn bump_detail_epoch(&mut self, id: &str) {
        *self.detail_epochs.entry(id.to_string()).or_insert(0) += 1;
    }

    /// Land a background list refresh. Returns false (and changes nothing)
    /// when the epoch moved since the refresh started.
    pub fn apply_list_refresh(
        &mut self,
        epoch: u64,
        todos: Vec<Todo>,
        now: DateTime<Utc>,
    ) -> bool {
        if epoch != self.list_epoch {
            tracing::debug!("discarding list refresh from a superseded epoch");
            return false;
        }
        self.store_list(todos, now);
        true
    }

    /// Land a background detail refresh, subject to the same epoch check.
    pub fn apply_detail_refresh(
        &mut self,
        id: &str,
        epoch: u64,
        todo: Todo,
        now: DateTime<Utc>,
    ) -> bool {
        if epoch != self.detail_epoch(id) {
            tracing::debug!(id, "discarding detail refresh from a superseded epoch");
            return false;
        }
        self.store_detail(todo, now);
        true
    }

    // ---- optimistic edits ----

    /// Edit the cached list value in place, when one exists.
    ///
    /// The entry is renewed as of `now`: an optimistic publish counts as
    /// fresh data, so a concurrent read of an aged entry cannot start a
    /// refresh that would land pre-mutation server state over it.
    pub fn edit_list(&mut self, now: DateTime<Utc>, edit: impl FnOnce(&mut Vec<Todo>)) {
        if let Some(entry) = &mut self.list {
            edit(&mut entry.value);
            entry.renew(now);
        }
    }

    /// Edit a cached detail value in place, when one exists. Renews the
    /// entry the same way [`edit_list`](Self::edit_list) does.
    pub fn edit_detail(&mut self, id: &str, now: DateTime<Utc>, edit: impl FnOnce(&mut Todo)) {
        if let Some(entry) = self.details.get_mut(id) {
            edit(&mut entry.value);
            entry.renew(now);
        }
    }

    // ---- invalidation and eviction ----

    /// Mark the list view stale; the next read triggers a refetch.
    pub fn mark_list_stale(&mut self) {
        if let Some(entry) = &mut self.list {
            entry.stale = true;
        }
    }

    /// Mark a detail view stale.
    pub fn mark_detail_stale(&mut self, id: &str) {
        if let Some(entry) = self.details.get_mut(id) {
            entry.stale = true;
        }
    }

    /// Drop a detail entry entirely (the key stops being meaningful after
    /// a successful delete).
    pub fn remove_detail(&mut self, id: &str) {
        self.details.remove(id);
        self.detail_epochs.remove(id);
    }

    /// Evict every entry unused beyond the retention window.
    pub fn evict_expired(&mut self, now: DateTime<Utc>, config: &CacheConfig) {
        let list_expired = self
            .list
            .as_ref()
            .is_some_and(|entry| now - entry.last_used > config.retention);
        if list_expired {
            self.list = None;
        }
        self.details
            .retain(|_, entry| now - entry.last_used <= config.retention);
    }

    // ---- snapshot plumbing for the mutation state machine ----

    pub(crate) fn list_entry(&self) -> Option<CacheEntry<Vec<Todo>>> {
        self.list.clone()
    }

    pub(crate) fn restore_list_entry(&mut self, entry: Option<CacheEntry<Vec<Todo>>>) {
        self.list = entry;
    }

    pub(crate) fn detail_entry(&self, id: &str) -> Option<CacheEntry<Todo>> {
        self.details.get(id).cloned()
    }

    pub(crate) fn restore_detail_entry(&mut self, id: &str, entry: Option<CacheEntry<Todo>>) {
        match entry {
            Some(entry) => {
                self.details.insert(id.to_string(), entry);
            }
            None => {
                self.details.remove(id);
            }
        }
    }
}
