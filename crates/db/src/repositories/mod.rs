//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod letter_repo;
pub mod signature_repo;

pub use letter_repo::LetterRepo;
pub use signature_repo::SignatureRepo;
