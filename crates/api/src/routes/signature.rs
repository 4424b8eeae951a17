//! Route definitions for the `/signatures` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::signature;
use crate::state::AppState;

/// Routes mounted at `/signatures`.
///
/// ```text
/// GET    /confirm?token=          -> confirm
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/confirm", get(signature::confirm))
}
