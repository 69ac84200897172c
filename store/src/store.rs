//! The authoritative todo collection.

use crate::clock::Clock;
use crate::id::IdGenerator;
use crate::persistence::Snapshot;
use crate::todo::{Todo, UpdateTodo};
use std::sync::Arc;

/// Single-writer store owning the canonical todo collection.
///
/// Records are kept in insertion order. Every successful mutation rewrites
/// the persisted snapshot; a snapshot failure is logged as a warning and
/// the in-memory mutation stands (the process memory stays authoritative).
///
/// The store is explicitly constructed and injected into its callers; it
/// is not a global singleton. It does not serialize concurrent access by
/// itself - callers wrap it in a lock when shared.
pub struct TodoStore {
    todos: Vec<Todo>,
    snapshot: Box<dyn Snapshot>,
    clock: Arc<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl TodoStore {
    /// Opens a store over the given snapshot, loading any persisted
    /// records.
    ///
    /// A snapshot that fails to load is logged and treated as empty.
    #[must_use]
    pub fn open(
        snapshot: Box<dyn Snapshot>,
        clock: Arc<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        let todos = match snapshot.load() {
            Ok(todos) => todos,
            Err(err) => {
                tracing::warn!(error = %err, "failed to load todo snapshot, starting empty");
                Vec::new()
            }
        };
        Self {
            todos,
            snapshot,
            clock,
            ids,
        }
    }

    /// All todos in insertion order, as a defensive copy.
    #[must_use]
    pub fn list(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    /// Looks up a todo by id. Absent is not an error.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Creates a new todo from `title` and appends it to the collection.
    ///
    /// The title is trimmed; non-emptiness is validated at the API
    /// boundary before this is called. `created_at == updated_at` on the
    /// returned record.
    pub fn create(&mut self, title: &str) -> Todo {
        let todo = Todo::new(
            self.ids.generate(),
            title.trim().to_string(),
            self.clock.now(),
        );
        self.todos.push(todo.clone());
        self.persist();
        todo
    }

    /// Applies a partial update over the todo with `id`.
    ///
    /// Only provided fields are merged; `updated_at` is refreshed. Returns
    /// `None` when the id is unknown, in which case nothing is persisted.
    pub fn update(&mut self, id: &str, update: UpdateTodo) -> Option<Todo> {
        let now = self.clock.now();
        let todo = self.todos.iter_mut().find(|todo| todo.id == id)?;
        if let Some(title) = update.title {
            todo.title = title.trim().to_string();
        }
        if let Some(completed) = update.completed {
            todo.completed = completed;
        }
        todo.updated_at = now;
        let updated = todo.clone();
        self.persist();
        Some(updated)
    }

    /// Removes the todo with `id`, reporting whether a record existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.todos.len();
        self.todos.retain(|todo| todo.id != id);
        if self.todos.len() == before {
            return false;
        }
        self.persist();
        true
    }

    /// Removes every completed todo, returning how many were removed.
    ///
    /// The snapshot is rewritten once for the whole batch.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|todo| !todo.completed);
        let removed = before - self.todos.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    // Persistence is best-effort: a failed write is a warning, never an
    // error to the caller.
    fn persist(&self) {
        if let Err(err) = self.snapshot.save(&self.todos) {
            tracing::warn!(error = %err, "failed to persist todo snapshot");
        }
    }
}
