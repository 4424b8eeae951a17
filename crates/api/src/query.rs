//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Query parameters for a single letter page (`?locale=&limit=`).
///
/// `limit` caps the embedded verified signatures; `0` means all of them.
#[derive(Debug, Default, Deserialize)]
pub struct LetterPageParams {
    pub locale: Option<String>,
    pub limit: Option<i64>,
}

/// Query parameters for the signature confirmation link (`?token=`).
#[derive(Debug, Deserialize)]
pub struct ConfirmParams {
    pub token: String,
}
