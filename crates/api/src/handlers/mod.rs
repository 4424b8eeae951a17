pub mod letter;
pub mod signature;
