//! Domain logic for the open-letter platform.
//!
//! Everything here is pure: no database handles, no HTTP types. The
//! repository and API crates call into these modules for slug generation,
//! HTML sanitization, locale handling, teaser text and token derivation.

pub mod error;
pub mod letter;
pub mod locale;
pub mod pagination;
pub mod sanitize;
pub mod slug;
pub mod teaser;
pub mod token;
pub mod types;
