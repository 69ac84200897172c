//! # Tasklist Web
//!
//! Axum HTTP surface for the tasklist store.
//!
//! Every endpoint answers with the uniform envelope
//! `{success, data?, error?, timestamp}`; failures carry one of
//! `VALIDATION_ERROR` (400), `NOT_FOUND` (404), or `INTERNAL_ERROR` (500).
//!
//! # Request Flow
//!
//! 1. **HTTP request** arrives at an Axum handler
//! 2. **Extract and validate** the body ([`ValidJson`]) and path
//! 3. **Dispatch** the store operation under the state lock
//! 4. **Map the result** to an [`ApiResponse`] envelope or [`ApiError`]
//!
//! # Routes
//!
//! | Operation       | Method + path            | Success |
//! |-----------------|--------------------------|---------|
//! | List            | `GET /todos`             | 200     |
//! | Get one         | `GET /todos/:id`         | 200     |
//! | Create          | `POST /todos`            | 201     |
//! | Update          | `PATCH /todos/:id`       | 200     |
//! | Delete          | `DELETE /todos/:id`      | 200     |
//! | Clear completed | `DELETE /todos/completed`| 200     |
//! | Liveness        | `GET /health`            | 200     |

pub mod envelope;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

use axum::{
    Router,
    routing::{delete, get},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// Re-export key types for convenience
pub use envelope::{ApiResponse, ErrorBody, ErrorCode};
pub use error::ApiError;
pub use extractors::ValidJson;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, ApiError>;

/// Build the application router over the given state.
///
/// The `/todos/completed` route is registered alongside `/todos/:id`;
/// static segments win, so the sweep is not shadowed by the id route.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/todos",
            get(handlers::todos::list_todos).post(handlers::todos::create_todo),
        )
        .route("/todos/completed", delete(handlers::todos::clear_completed))
        .route(
            "/todos/:id",
            get(handlers::todos::get_todo)
                .patch(handlers::todos::update_todo)
                .delete(handlers::todos::delete_todo),
        )
        .route("/health", get(handlers::health::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
