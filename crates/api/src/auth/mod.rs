//! Credential primitives for letter authors.
//!
//! - [`password`] -- Argon2id hashing of the optional letter password.

pub mod password;
