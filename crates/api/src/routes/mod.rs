pub mod conversions;
pub mod downloads;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /conversions               list active (GET), submit (POST)
/// /conversions/history       completed-conversion history
/// /conversions/runtime       converter runtime availability
/// /conversions/{id}          job status snapshot
///
/// /downloads/{filename}      converted drawing download
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/conversions", conversions::router())
        .nest("/downloads", downloads::router())
}
