//! Repository implementations for database operations

pub mod claims;
pub mod users;

pub use claims::*;
pub use users::*;
