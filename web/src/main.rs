//! Tasklist server binary.
//!
//! Builds the store from its environment-configured snapshot path and
//! serves the todo API.
//!
//! Configuration (environment variables):
//! - `TASKLIST_ADDR` - bind address, default `127.0.0.1:3000`
//! - `TASKLIST_DATA` - snapshot file path, default `todos.json`

use std::sync::Arc;
use tasklist_store::clock::SystemClock;
use tasklist_store::id::TimeRandomIds;
use tasklist_store::persistence::JsonFileSnapshot;
use tasklist_store::TodoStore;
use tasklist_web::{router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("TASKLIST_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let data_path =
        std::env::var("TASKLIST_DATA").unwrap_or_else(|_| "todos.json".to_string());

    let store = TodoStore::open(
        Box::new(JsonFileSnapshot::new(&data_path)),
        Arc::new(SystemClock),
        Box::new(TimeRandomIds),
    );
    tracing::info!(%addr, data = %data_path, "starting tasklist server");

    let app = router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
