//! Route definitions for the `/conversions` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::conversions;
use crate::state::AppState;

/// Routes mounted at `/conversions`.
///
/// ```text
/// GET    /            -> list_active_conversions
/// POST   /            -> submit_conversion
/// GET    /history     -> get_history
/// GET    /runtime     -> runtime_availability
/// GET    /{id}        -> get_conversion
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(conversions::list_active_conversions).post(conversions::submit_conversion),
        )
        .route("/history", get(conversions::get_history))
        .route("/runtime", get(conversions::runtime_availability))
        .route("/{id}", get(conversions::get_conversion))
}
