//! Domain types for todo records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single todo record.
///
/// `id` and `created_at` are assigned once at creation and never change;
/// `updated_at` moves forward on every successful mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Opaque unique identifier, assigned by the store.
    pub id: String,
    /// Title of the todo; never empty or whitespace-only once stored.
    pub title: String,
    /// Whether the todo is completed.
    pub completed: bool,
    /// When the todo was created.
    pub created_at: DateTime<Utc>,
    /// When the todo was last mutated (equals `created_at` at creation).
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new todo with `completed = false` and both timestamps set
    /// to `now`.
    #[must_use]
    pub const fn new(id: String, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update applied over an existing [`Todo`].
///
/// Only the provided fields are merged; everything else is left untouched.
/// Also the PATCH request body shape on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTodo {
    /// New title, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New completion flag, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl UpdateTodo {
    /// Update that only changes the title.
    #[must_use]
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    /// Update that only changes the completion flag.
    #[must_use]
    pub const fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    /// Returns true when no field is provided.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}
