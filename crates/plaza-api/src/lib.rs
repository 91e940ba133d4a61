pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod follows;
pub mod middleware;
pub mod posts;
pub mod routes;
pub mod users;
pub mod validation;

pub use auth::{AppState, AppStateInner};
pub use routes::router;

use std::sync::Arc;

use tracing::error;

use plaza_db::Database;

use crate::error::ApiError;

/// Run a blocking store operation off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> plaza_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
