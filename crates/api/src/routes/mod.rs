pub mod health;
pub mod letter;
pub mod signature;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /letters                                 list, create
/// /letters/{slug}                          letter page
/// /letters/{slug}/locales                  all locale variants
/// /letters/{slug}/updates                  post an update (token or password)
/// /letters/{slug}/{locale}/sign            sign (unverified until confirmed)
///
/// /signatures/confirm?token=               confirm a signature
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/letters", letter::router())
        .nest("/signatures", signature::router())
}
