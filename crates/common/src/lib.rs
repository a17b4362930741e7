//! Shared types, protocol definitions, and errors for the LivApp API crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
