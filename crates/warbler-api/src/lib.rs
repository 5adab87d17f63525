pub mod auth;
pub mod likes;
pub mod messages;
pub mod routes;
pub mod session;
pub mod users;
pub mod views;

use axum::http::StatusCode;
use tracing::error;
use warbler_db::Database;

pub use auth::{AppState, AppStateInner};
pub use routes::router;

/// Parse an id path segment; anything that is not an `i64` names no resource.
pub(crate) fn parse_id(raw: &str) -> Result<i64, StatusCode> {
    raw.parse::<i64>().map_err(|_| StatusCode::NOT_FOUND)
}

/// Run a store call on the blocking pool, keeping the store's own error.
pub(crate) async fn try_db<F, T>(state: &AppState, f: F) -> Result<warbler_db::Result<T>, StatusCode>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

/// Like [`try_db`], but any store error becomes a 500.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, StatusCode>
where
    F: FnOnce(&Database) -> warbler_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    try_db(state, f).await?.map_err(|e| {
        error!("Database error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
