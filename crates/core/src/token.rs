//! Letter and signature tokens.
//!
//! A letter token is derived, never chosen: it is the SHA-256 digest of the
//! slug, the owning user and the application secret. Anything that changes
//! the slug or the owner must derive it again. Signature tokens are random
//! and single-use.

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::types::DbId;

/// Length of a signature confirmation token.
pub const SIGNATURE_TOKEN_LENGTH: usize = 32;

/// Derive the token for a letter row.
///
/// An absent owner is rendered as an empty segment so ownerless letters
/// still get a stable token.
pub fn letter_token(slug: &str, user_id: Option<DbId>, secret: &str) -> String {
    let owner = user_id.map(|id| id.to_string()).unwrap_or_default();
    let digest = Sha256::new()
        .chain_update(slug)
        .chain_update("-")
        .chain_update(owner)
        .chain_update("-")
        .chain_update(secret)
        .finalize();
    format!("{digest:x}")
}

/// Generate a random alphanumeric signature confirmation token.
pub fn signature_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(SIGNATURE_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Compare two tokens without short-circuiting on the first mismatch.
pub fn tokens_match(expected: &str, provided: &str) -> bool {
    let a = expected.as_bytes();
    let b = provided.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
