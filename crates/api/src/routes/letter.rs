//! Route definitions for the `/letters` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{letter, signature};
use crate::state::AppState;

/// Routes mounted at `/letters`.
///
/// ```text
/// GET    /                        -> list
/// POST   /                        -> create
/// GET    /{slug}                  -> get_by_slug
/// PUT    /{slug}                  -> edit
/// PUT    /{slug}/owner            -> assign_owner
/// GET    /{slug}/locales          -> list_locales
/// POST   /{slug}/updates          -> create_update
/// POST   /{slug}/{locale}/sign    -> signature::sign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(letter::list).post(letter::create))
        .route("/{slug}", get(letter::get_by_slug).put(letter::edit))
        .route("/{slug}/owner", put(letter::assign_owner))
        .route("/{slug}/locales", get(letter::list_locales))
        .route("/{slug}/updates", post(letter::create_update))
        .route("/{slug}/{locale}/sign", post(signature::sign))
}
