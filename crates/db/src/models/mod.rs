//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Serialize` response struct carrying only public fields
//! - `Deserialize` DTOs for inserts and patches

pub mod letter;
pub mod signature;
