//! Route definitions for the `/downloads` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::downloads;
use crate::state::AppState;

/// Routes mounted at `/downloads`.
///
/// ```text
/// GET    /{filename}    -> download_output
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{filename}", get(downloads::download_output))
}
