//! The optimistic mutation state machine.
//!
//! Every mutating action runs the same protocol over the cache:
//!
//! 1. [`Mutation::begin`] bumps the affected epochs (cancelling conflicting
//!    refreshes before anything optimistic is published) and snapshots the
//!    affected entries,
//! 2. the caller publishes its optimistic value(s),
//! 3. after the network call settles, [`Mutation::commit`] discards the
//!    snapshot or [`Mutation::roll_back`] restores it exactly,
//! 4. both settle paths mark the affected keys stale, so the next read is
//!    authoritative.
//!
//! The transitions are plain data transformations over [`QueryCache`]; a
//! mutation is `Pending` from `begin` until it is consumed by exactly one
//! of the settle calls.

use crate::cache::{CacheEntry, QueryCache};
use tasklist_store::Todo;

/// A logical cache key touched by a mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryKey {
    /// The list-of-all-todos view.
    List,
    /// The per-id detail view.
    Detail(String),
}

/// Where a mutation ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationPhase {
    /// Snapshot captured, optimistic value may be published.
    Pending,
    /// Server confirmed; snapshot discarded, keys invalidated.
    Committed,
    /// Server failed; snapshot restored, keys invalidated.
    RolledBack,
}

// Captured pre-mutation entries, restored verbatim on rollback.
#[derive(Debug)]
struct CacheSnapshot {
    list: Option<Option<CacheEntry<Vec<Todo>>>>,
    details: Vec<(String, Option<CacheEntry<Todo>>)>,
}

/// One in-flight optimistic mutation.
#[derive(Debug)]
pub struct Mutation {
    keys: Vec<QueryKey>,
    snapshot: CacheSnapshot,
}

impl Mutation {
    /// Start a mutation over the given keys.
    ///
    /// Bumps each key's epoch first, so no refresh that started before
    /// this point can overwrite whatever the caller publishes next, then
    /// captures the rollback snapshot.
    #[must_use]
    pub fn begin(cache: &mut QueryCache, keys: Vec<QueryKey>) -> Self {
        let mut snapshot = CacheSnapshot {
            list: None,
            details: Vec::new(),
        };
        for key in &keys {
            match key {
                QueryKey::List => {
                    cache.bump_list_epoch();
                    snapshot.list = Some(cache.list_entry());
                }
                QueryKey::Detail(id) => {
                    cache.bump_detail_epoch(id);
                    snapshot.details.push((id.clone(), cache.detail_entry(id)));
                }
            }
        }
        Self { keys, snapshot }
    }

    /// The keys this mutation touches.
    #[must_use]
    pub fn keys(&self) -> &[QueryKey] {
        &self.keys
    }

    /// Settle successfully: drop the snapshot and invalidate the keys so
    /// the next read refetches authoritative state (reconciling temporary
    /// ids, for creates).
    pub fn commit(self, cache: &mut QueryCache) -> MutationPhase {
        Self::invalidate(&self.keys, cache);
        MutationPhase::Committed
    }

    /// Settle on failure: restore every affected entry exactly as
    /// captured, then invalidate the keys.
    pub fn roll_back(self, cache: &mut QueryCache) -> MutationPhase {
        let Self { keys, snapshot } = self;
        if let Some(list) = snapshot.list {
            cache.restore_list_entry(list);
        }
        for (id, entry) in snapshot.details {
            cache.restore_detail_entry(&id, entry);
        }
        Self::invalidate(&keys, cache);
        MutationPhase::RolledBack
    }

    // Unconditional on both settle paths: optimistic values are never
    // trusted as permanent truth.
    fn invalidate(keys: &[QueryKey], cache: &mut QueryCache) {
        for key in keys {
            match key {
                QueryKey::List => cache.mark_list_stale(),
                QueryKey::Detail(id) => cache.mark_detail_stale(id),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, CacheRead};
    use chrono::Utc;

    fn sample(id: &str) -> Todo {
        Todo::new(id.to_string(), format!("todo {id}"), Utc::now())
    }

    fn listed(cache: &mut QueryCache) -> Vec<Todo> {
        match cache.read_list(Utc::now(), &CacheConfig::default()) {
            CacheRead::Fresh(todos) | CacheRead::Stale(todos) => todos,
            CacheRead::Miss => panic!("expected a cached list"),
        }
    }

    #[test]
    fn begin_bumps_epochs_before_anything_else() {
        let mut cache = QueryCache::new();
        cache.store_list(vec![sample("a")], Utc::now());
        let pre_mutation_epoch = cache.list_epoch();

        let _mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
        assert_ne!(cache.list_epoch(), pre_mutation_epoch);
    }

    #[test]
    fn commit_invalidates_without_restoring() {
        let mut cache = QueryCache::new();
        let now = Utc::now();
        cache.store_list(vec![sample("a")], now);

        let mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
        cache.edit_list(now, |todos| todos.push(sample("temp_b")));

        assert_eq!(mutation.commit(&mut cache), MutationPhase::Committed);
        // Optimistic value survives, but is stale so the next read refetches.
        let read = cache.read_list(now, &CacheConfig::default());
        assert!(matches!(read, CacheRead::Stale(todos) if todos.len() == 2));
    }

    #[test]
    fn roll_back_restores_the_exact_snapshot() {
        let mut cache = QueryCache::new();
        let now = Utc::now();
        cache.store_list(vec![sample("a")], now);
        let before = listed(&mut cache);

        let mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
        cache.edit_list(now, |todos| todos.push(sample("temp_b")));
        assert_eq!(listed(&mut cache).len(), 2);

        assert_eq!(mutation.roll_back(&mut cache), MutationPhase::RolledBack);
        assert_eq!(listed(&mut cache), before);
    }

    #[test]
    fn roll_back_restores_an_absent_entry_as_absent() {
        let mut cache = QueryCache::new();
        let now = Utc::now();

        let mutation = Mutation::begin(
            &mut cache,
            vec![QueryKey::List, QueryKey::Detail("a".to_string())],
        );
        cache.store_list(vec![sample("a")], now);
        cache.store_detail(sample("a"), now);

        mutation.roll_back(&mut cache);
        assert_eq!(cache.read_list(now, &CacheConfig::default()), CacheRead::Miss);
        assert_eq!(
            cache.read_detail("a", now, &CacheConfig::default()),
            CacheRead::Miss
        );
    }

    #[test]
    fn detail_keys_are_snapshotted_and_restored() {
        let mut cache = QueryCache::new();
        let now = Utc::now();
        cache.store_detail(sample("a"), now);

        let mutation = Mutation::begin(&mut cache, vec![QueryKey::Detail("a".to_string())]);
        cache.edit_detail("a", now, |todo| todo.completed = true);

        mutation.roll_back(&mut cache);
        let read = cache.read_detail("a", now, &CacheConfig::default());
        assert!(matches!(read, CacheRead::Stale(todo) if !todo.completed));
    }

    #[test]
    fn a_refresh_started_before_the_mutation_cannot_clobber_it() {
        let mut cache = QueryCache::new();
        let now = Utc::now();
        cache.store_list(vec![sample("a")], now);

        // Background refresh takes its epoch...
        let refresh_epoch = cache.list_epoch();

        // ...mutation begins and publishes optimistically.
        let mutation = Mutation::begin(&mut cache, vec![QueryKey::List]);
        cache.edit_list(now, |todos| todos.push(sample("temp_b")));

        // The old refresh lands with pre-mutation data: ignored.
        assert!(!cache.apply_list_refresh(refresh_epoch, vec![sample("a")], now));
        assert_eq!(listed(&mut cache).len(), 2);

        mutation.commit(&mut cache);
    }
}
