pub mod builder;
pub mod error;
pub mod order;
pub mod types;

pub use builder::{build, validate_identifier, QueryBuilder};
pub use error::QueryError;
pub use types::*;
